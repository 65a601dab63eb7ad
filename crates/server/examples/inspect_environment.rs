//! Builds a server request from the CGI variables of the current process and logs it.
//!
//! ```sh
//! REQUEST_METHOD=GET REQUEST_URI='/items?x=1' HTTP_COOKIE='id=7' \
//!     cargo run -p micro-server-request --example inspect_environment
//! ```

use micro_message::prelude::*;
use micro_server_request::{Environment, FormFields, ServerRequest};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let environment = Environment::from_process_env();

    let fields = match FormFields::from_query(environment.get("QUERY_STRING").unwrap_or_default()) {
        Ok(fields) => fields,
        Err(e) => {
            error!(cause = %e, "invalid query string");
            return;
        }
    };

    let request = match ServerRequest::from_environment(&environment, &fields) {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "failed to build server request");
            return;
        }
    };

    info!(
        method = request.method(),
        target = %request.request_target(),
        version = %request.protocol_version(),
        "received request"
    );
    for (name, values) in request.headers() {
        info!(name, value = %values.join(", "), "header");
    }
    for (name, value) in request.cookie_params() {
        info!(name = %name, value = %value, "cookie");
    }
    for (name, value) in request.query_params() {
        info!(name = %name, value = %value, "query param");
    }
}
