use rawcon::campaign::IdentityState;
use rawcon::config::ConsoleConfig;
use rawcon::console::Console;
use rawcon::paths;
use rawcon::store::KeyValueStore;

use crate::output;

pub fn cmd_status<S: KeyValueStore>(console: &Console<S>, json: bool) -> i32 {
    let status = console.status();
    if json {
        output::print_json(&status);
        return 0;
    }
    match console.tracker().state() {
        IdentityState::Unset => println!("Current campaign: (none)"),
        IdentityState::Bound(id) => println!("Current campaign: {id}"),
    }
    if !status.last_campaign.is_empty() {
        println!("Previous campaign: {}", status.last_campaign);
    }
    println!(
        "Base URL: {}",
        status.base_url.as_deref().unwrap_or("(relative)")
    );
    println!("Known campaigns: {}", status.known_campaigns);
    println!("History entries: {}", status.history_len);
    0
}

pub fn cmd_config_show<S: KeyValueStore>(console: &Console<S>, config: &ConsoleConfig) -> i32 {
    let show = |p: Option<std::path::PathBuf>| {
        p.map_or_else(|| "(unavailable)".to_owned(), |p| p.display().to_string())
    };
    println!(
        "base_url = {}",
        console.base_url().unwrap_or("(relative)")
    );
    println!(
        "config_base_url = {}",
        config.base_url.as_deref().unwrap_or("(unset)")
    );
    println!("export_dir = {}", show(config.export_dir.clone()));
    println!("config_file = {}", show(paths::config_path()));
    println!("database = {}", show(paths::db_path()));
    0
}

pub fn cmd_campaign_list<S: KeyValueStore>(console: &mut Console<S>, fail: bool) -> i32 {
    let out = console.refresh_campaigns();
    print_options(console);
    output::finish(&out, fail)
}

pub fn cmd_campaign_options<S: KeyValueStore>(console: &Console<S>) -> i32 {
    if console.tracker().options().is_empty() {
        eprintln!("[rawcon] no known campaigns; run `rawcon campaign list`");
        return 0;
    }
    print_options(console);
    0
}

fn print_options<S: KeyValueStore>(console: &Console<S>) {
    let current = console.tracker().current();
    for option in console.tracker().options() {
        let marker = if option.id == current { "*" } else { " " };
        println!("{marker} {}\t{}", option.id, option.label);
    }
}

pub fn cmd_campaign_create<S: KeyValueStore>(console: &mut Console<S>, fail: bool) -> i32 {
    let out = console.create_campaign();
    if let Some(entry) = console.ledger().get(0) {
        println!("{}", entry.response_raw);
    }
    output::finish(&out, fail)
}

pub fn cmd_actor_select<S: KeyValueStore>(console: &mut Console<S>, fail: bool) -> i32 {
    let out = console.select_actor();
    println!("{}", out.value.response_text);
    output::finish(&out, fail)
}
