pub mod mock_release_source;
pub mod range_server;
