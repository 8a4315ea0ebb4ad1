mod smoke_tests;

// Integration tests, grouped by what they exercise:
// - smoke_tests: config defaults, session persistence, component lifecycle, CLI parsing
// - backend_mock: services end to end against an in-memory backend
// - http_client: the reqwest transport and refresh flow against a wiremock server
