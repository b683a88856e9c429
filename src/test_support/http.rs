use httpmock::MockServer;

/// Start a fresh `httpmock::MockServer` for exchange backend tests.
pub fn start_mock_server() -> MockServer {
    MockServer::start()
}
