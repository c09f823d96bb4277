use anyhow::Result;
use hnetl::HackerNewsETL;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        let prog = args
            .first()
            .and_then(|s| Path::new(s).file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("hnetl");
        eprintln!("Usage: {} <src> <dst>", prog);
        process::exit(2);
    }
    let src = PathBuf::from(&args[1]);
    let dst = PathBuf::from(&args[2]);

    let etl = HackerNewsETL::new()
        .workers(50)
        .progress(true)
        .progress_label("Building threads");

    let items = Arc::new(etl.load_items(&src)?);
    let sink = etl.jsonl_sink(&dst)?;

    let (written, summary) = etl.run(items, sink)?;

    println!("wrote {} threads to {}", written, dst.display());
    println!(
        "scanned {} stories; skipped {} stubs, {} zombies, {} missing children",
        summary.scanned, summary.stub_roots, summary.zombies, summary.missing_children
    );
    Ok(())
}
