// toy_piano_service: HTTP endpoint for Quantum Toy Piano compositions.
//
// A thin synchronous service in front of `toy_piano_compose`. Each request
// is validated, turned into a circuit manifest, executed on the configured
// oracle backend, walked and rendered, all before the next request is
// accepted. No state survives a request except the oracle backend itself.
//
// Module overview:
// - `request.rs`:      Query-string parsing and validation into a
//                      `CounterpointRequest`. Nothing reaches the oracle
//                      unless validation passes.
// - `counterpoint.rs`: The endpoint pipeline (manifest -> oracle -> supply ->
//                      walk -> renderers) and the JSON response type.
// - `server.rs`:       `tiny_http` listener and the single-threaded request
//                      loop, running on a background thread until stopped.
// - `error.rs`:        Request/service error types and their HTTP statuses.
//
// The service can run as a standalone binary (`main.rs`) or be embedded via
// the library API (`start_service`).

pub mod counterpoint;
pub mod error;
pub mod request;
pub mod server;

pub use server::start_service;
