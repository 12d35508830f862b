use std::path::Path;

use rawcon::console::Console;
use rawcon::history;
use rawcon::store::KeyValueStore;

pub fn cmd_history_list<S: KeyValueStore>(console: &Console<S>, full: bool) -> i32 {
    print!("{}", history::render(console.ledger().entries(), full));
    0
}

pub fn cmd_history_show<S: KeyValueStore>(
    console: &Console<S>,
    index: usize,
    request: bool,
    response: bool,
) -> i32 {
    let Some(entry) = console.ledger().get(index) else {
        eprintln!("[rawcon] history entry {index} not found");
        return 1;
    };

    if request {
        print!("{}", entry.request_raw);
        return 0;
    }
    if response {
        print!("{}", entry.response_raw);
        return 0;
    }

    println!("Timestamp: {}", entry.timestamp);
    println!("Endpoint: {}", entry.endpoint);
    println!("{}", entry.url_line());
    println!("Status: {}", entry.status);
    println!("Latency: {}ms", entry.latency);
    println!("\n--- Request Raw ---");
    println!("{}", entry.request_raw);
    println!("\n--- Response Raw ---");
    println!("{}", entry.response_raw);
    0
}

pub fn cmd_history_export<S: KeyValueStore>(
    console: &Console<S>,
    dir: &Path,
) -> anyhow::Result<i32> {
    let path = console.export_history(dir)?;
    eprintln!(
        "[rawcon] exported {} entries to {}",
        console.ledger().len(),
        path.display()
    );
    println!("{}", path.display());
    Ok(0)
}
