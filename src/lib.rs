// Library root
// -----------
// The `gist` binary is a thin wrapper around these modules.
//
// Module responsibilities:
// - `api`: the gateway. One blocking HTTP request per remote operation,
//   status codes mapped to success or a typed `ApiError`.
// - `cli`: command line definition (`gist ...` / `repo ...`).
// - `clipboard`: best-effort copy of resulting URLs.
// - `credentials`: bearer token file and the first-run authorization.
// - `ui`: controllers turning commands into gateway calls and output.
pub mod api;
pub mod cli;
pub mod clipboard;
pub mod credentials;
pub mod ui;
