//! Vector insert worker.
//!
//! Runs a single collection insert in its own process so native-library
//! crashes cannot take down the caller. Invoked as:
//!
//! ```text
//! sabaq-vector-worker <db_path> <payload_json_path>
//! ```
//!
//! Exit codes: 0 on success, 2 when the storage backend cannot be
//! initialized, 3 on any runtime failure. Diagnostics go to stderr.

use sabaq_vector::lance;
use sabaq_vector::payload::{
    WorkerPayload, EXIT_BACKEND_UNAVAILABLE, EXIT_OK, EXIT_RUNTIME_FAILURE,
};
use std::path::Path;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: sabaq-vector-worker <db_path> <payload_json>");
        std::process::exit(1);
    }

    std::process::exit(run(Path::new(&args[1]), Path::new(&args[2])).await);
}

async fn run(db_path: &Path, payload_path: &Path) -> i32 {
    let data = match std::fs::read_to_string(payload_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("failed to read payload {:?}: {}", payload_path, e);
            return EXIT_RUNTIME_FAILURE;
        }
    };

    let payload: WorkerPayload = match serde_json::from_str(&data) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("invalid payload: {}", e);
            return EXIT_RUNTIME_FAILURE;
        }
    };

    if payload.documents.is_empty() {
        println!("added");
        return EXIT_OK;
    }

    let conn = match lance::connect(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("backend unavailable: {}", e);
            return EXIT_BACKEND_UNAVAILABLE;
        }
    };

    let embedding_dim = payload.documents[0].embeddings.len();

    let table = match lance::open_or_create_table(&conn, &payload.collection_name, embedding_dim).await
    {
        Ok(table) => table,
        Err(e) => {
            eprintln!("failed to open collection '{}': {}", payload.collection_name, e);
            return EXIT_RUNTIME_FAILURE;
        }
    };

    if let Err(e) = lance::append_documents(&table, &payload.documents, embedding_dim).await {
        eprintln!("insert failed: {}", e);
        return EXIT_RUNTIME_FAILURE;
    }

    println!("added");
    EXIT_OK
}
