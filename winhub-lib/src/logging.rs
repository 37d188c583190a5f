use tracing_indicatif::style::ProgressStyle;

use anyhow::Result;
use tracing::field::{Field, Visit};
use tracing::span::Record;
use tracing::{Event, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Style for the aggregate downloads notification: task count and mean
/// percentage, driven by positions 0..=100.
pub fn aggregate_bar_style() -> Result<ProgressStyle> {
    let style = ProgressStyle::with_template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}%")?
        .progress_chars("=>-");
    Ok(style)
}

pub fn spinner_style(template: &str) -> Result<ProgressStyle> {
    Ok(ProgressStyle::with_template(&format!(
        "{{spinner:.green}} {template}"
    ))?)
}

/// Console logging: bare messages, progress bars layered on top,
/// verbosity switchable through `RUST_LOG`.
pub fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let progress_bar_layer = IndicatifLayer::new();
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(false)
        .without_time()
        .event_format(BareLineFormat)
        .fmt_fields(MessageFieldOnly);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(progress_bar_layer)
        .init();
}

/// Writes only the `message` field of an event, with no `message=`
/// prefix and no other fields.
pub struct MessageFieldOnly;

impl<'writer> FormatFields<'writer> for MessageFieldOnly {
    fn format_fields<R: RecordFields>(
        &self,
        mut writer: Writer<'writer>,
        fields: R,
    ) -> std::fmt::Result {
        struct MessageVisitor<'a> {
            writer: &'a mut dyn std::fmt::Write,
        }

        impl<'a> Visit for MessageVisitor<'a> {
            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    let _ = write!(self.writer, "{value:?}");
                }
            }
        }

        fields.record(&mut MessageVisitor {
            writer: &mut writer,
        });
        Ok(())
    }

    fn add_fields(
        &self,
        _current: &'writer mut FormattedFields<Self>,
        _fields: &Record<'_>,
    ) -> std::fmt::Result {
        Ok(())
    }
}

/// Event format without span context or metadata: the message is the
/// whole line.
#[derive(Clone, Debug, Default)]
pub struct BareLineFormat;

impl<S, N> FormatEvent<S, N> for BareLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
