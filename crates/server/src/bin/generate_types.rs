use std::{fs, path::PathBuf};

use assistant::{ChatReply, ErrorKind, Language};
use db::models::{
    chat_message::ChatRole,
    task::{Priority, TaskStatusFilter},
};
use server::routes::{
    chat::{ChatHistoryEntry, ChatRequest},
    health::HealthStatus,
};
use ts_rs::TS;

fn generate_types_content() -> String {
    let header = "// This file was generated by `cargo run --bin generate_types`. Do not edit it by hand.\n\n";

    let decls = [
        Language::decl(),
        ChatRole::decl(),
        Priority::decl(),
        TaskStatusFilter::decl(),
        ErrorKind::decl(),
        ChatRequest::decl(),
        ChatReply::decl(),
        ChatHistoryEntry::decl(),
        HealthStatus::decl(),
        utils::response::ApiResponse::<()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| format!("export {}", decl.trim_start_matches("export ")))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{header}{body}\n")
}

fn main() -> std::io::Result<()> {
    let check = std::env::args().any(|arg| arg == "--check");
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts");
    let generated = generate_types_content();

    if check {
        let current = fs::read_to_string(&path).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date");
            return Ok(());
        }
        eprintln!("shared/types.ts is stale; run `cargo run --bin generate_types`");
        std::process::exit(1);
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, generated)?;
    println!("Wrote {}", path.display());
    Ok(())
}
