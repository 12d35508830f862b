use rawcon::console::Outcome;
use rawcon::history::FailureKind;
use rawcon_common::projection::Projection;

/// Print a Serialize value as pretty JSON, logging errors to stderr.
pub fn print_json(value: &(impl serde::Serialize + ?Sized)) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("[rawcon] JSON serialization error: {e}"),
    }
}

/// Print status lines to stderr and pick the exit code.
pub fn finish<T>(outcome: &Outcome<T>, fail_on_error: bool) -> i32 {
    for message in &outcome.messages {
        eprintln!("[rawcon] {message}");
    }
    exit_code(outcome.failure, fail_on_error)
}

/// Print the derived slots and the raw body, then finish.
pub fn finish_projection(outcome: &Outcome<Projection>, fail_on_error: bool) -> i32 {
    print_projection(&outcome.value);
    finish(outcome, fail_on_error)
}

pub fn print_projection(projection: &Projection) {
    if !projection.is_decoded() {
        eprintln!("[rawcon] response is not a JSON object; showing raw body only");
    }
    for (slot, value) in projection.slots() {
        println!("--- {} ---", slot.label);
        println!("{value}");
    }
    println!("--- Raw ---");
    println!("{}", projection.raw());
}

pub const fn exit_code(failure: Option<FailureKind>, fail_on_error: bool) -> i32 {
    if fail_on_error && failure.is_some() {
        2
    } else {
        0
    }
}
