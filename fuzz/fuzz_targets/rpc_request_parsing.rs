#![no_main]
use clam_node::rpc::http::read_request;
use clam_node::rpc::types::JsonRequest;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    // Untrusted bytes straight off the socket: framing must fail cleanly
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(_) => return,
    };
    let mut reader = data;
    let request = runtime.block_on(read_request(&mut reader, 64 * 1024));

    let body = match &request {
        Ok(request) => {
            let _ = request.keep_alive();
            let _ = request.header("authorization");
            request.body.as_slice()
        }
        Err(_) => data,
    };

    // Body validation, both single and batch shaped
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        match &value {
            Value::Array(batch) => {
                for element in batch {
                    let _ = JsonRequest::parse(element);
                }
            }
            other => {
                let _ = JsonRequest::parse(other);
            }
        }
    }
});
