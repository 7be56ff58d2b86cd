//! Answer generation worker.
//!
//! Runs a single completion against the local LLM runtime in its own
//! process. Invoked as:
//!
//! ```text
//! sabaq-generate-worker <payload_json_path>
//! ```
//!
//! stdout carries a single JSON line: `{"generated_text": str}` on
//! success or `{"error": str}` on failure. Exit codes: 0 on success,
//! 2 when no payload file was provided, 3 on any runtime failure.

use sabaq_rag::generate::{GeneratePayload, EXIT_NO_PAYLOAD, EXIT_OK, EXIT_RUNTIME_FAILURE};
use sabaq_rag::ollama::OllamaGenerator;
use sabaq_rag::GenerateOutput;
use std::path::Path;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_output(&GenerateOutput {
            generated_text: None,
            error: Some("No payload file provided".to_string()),
        });
        std::process::exit(EXIT_NO_PAYLOAD);
    }

    std::process::exit(run(Path::new(&args[1])).await);
}

async fn run(payload_path: &Path) -> i32 {
    let payload: GeneratePayload = match std::fs::read_to_string(payload_path)
        .map_err(|e| e.to_string())
        .and_then(|data| serde_json::from_str(&data).map_err(|e| e.to_string()))
    {
        Ok(payload) => payload,
        Err(e) => {
            print_output(&GenerateOutput {
                generated_text: None,
                error: Some(format!("Invalid payload: {}", e)),
            });
            return EXIT_RUNTIME_FAILURE;
        }
    };

    // The worker is a separate process, so it picks its runtime settings
    // up from the environment rather than a shared config object
    let endpoint = std::env::var("SABAQ_GEN_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:11434".to_string());
    let model = std::env::var("SABAQ_GEN_MODEL").unwrap_or_else(|_| "llama3.2".to_string());

    let generator = OllamaGenerator::new(endpoint, model);

    match generator
        .generate(&payload.prompt, payload.max_new_tokens)
        .await
    {
        Ok(generated_text) => {
            print_output(&GenerateOutput {
                generated_text: Some(generated_text),
                error: None,
            });
            EXIT_OK
        }
        Err(e) => {
            print_output(&GenerateOutput {
                generated_text: None,
                error: Some(e.to_string()),
            });
            EXIT_RUNTIME_FAILURE
        }
    }
}

fn print_output(output: &GenerateOutput) {
    match serde_json::to_string(output) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("{{\"error\": \"failed to serialize output: {}\"}}", e),
    }
}
