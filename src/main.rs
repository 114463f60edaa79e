// Entry point and interactive menu.
//
// - Option [1] loads the booking export and recomputes the dashboard.
// - Option [2] picks the city filter and recomputes.
// - Option [3] prints every summary table and writes the exports.
use booking_dashboard::config::Config;
use booking_dashboard::output::{self, ConsoleRenderer};
use booking_dashboard::util::format_int;
use booking_dashboard::{init_tracing, DashboardError, Session};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::error;

const PREVIEW_ROWS: usize = 12;

// One session per run: the export is loaded once and recomputed on demand.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    let config = Config::from_env_and_args();
    let mut session = Session::new(config.time_basis);
    session.subscribe(Box::new(ConsoleRenderer));
    Mutex::new(AppState { config, session })
});

struct AppState {
    config: Config,
    session: Session,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn recompute(state: &mut AppState) {
    match state.session.recompute() {
        Ok(_) => {}
        Err(DashboardError::NoData) => {
            println!("Error: No data loaded. Please load the file first (option 1).\n")
        }
        Err(e) => error!("recompute failed: {}", e),
    }
}

/// Handle option [1]: load the export, keep the previous dataset on failure.
fn handle_load() {
    let mut state = state();
    let path = state.config.data_path.clone();
    match state.session.load(&path) {
        Ok(report) => {
            println!(
                "Processing dataset... ({} containers, {} booking documents)",
                format_int(report.containers),
                format_int(report.documents)
            );
            if report.skipped_documents > 0 {
                println!(
                    "Note: {} entries skipped because they are not booking documents.",
                    format_int(report.skipped_documents)
                );
            }
            if report.containers_without_documents > 0 {
                println!(
                    "Info: {} containers had no documents list.",
                    format_int(report.containers_without_documents)
                );
            }
            println!();
        }
        Err(e) => {
            error!(path = %path.display(), "load failed: {}", e);
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: choose from "ALL" plus every city in the dataset.
fn handle_select_filter() {
    let mut state = state();
    let options = state.session.city_options();
    println!("Current filter: {}", state.session.filter());
    for (idx, option) in options.iter().enumerate() {
        println!("[{}] {}", idx + 1, option);
    }
    let choice = read_choice();
    let picked = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| options.get(idx));
    let Some(option) = picked else {
        println!("Invalid choice. Filter unchanged.\n");
        return;
    };
    state.session.set_filter(option.parse().unwrap_or_default());
    recompute(&mut state);
}

/// Handle option [3]: print the dashboard and write CSV/JSON exports.
fn handle_generate_dashboard() {
    let state = state();
    let Some(published) = state.session.published() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    output::render_dashboard(published, PREVIEW_ROWS);
    match output::export_dashboard(&state.config.export_dir, published) {
        Ok(files) => {
            println!("Outputs saved to {} files in {}\n", files.len(), state.config.export_dir.display());
        }
        Err(e) => eprintln!("Write error: {}", e),
    }
}

fn main() {
    init_tracing();
    loop {
        println!("Booking Dashboard:");
        println!("[1] Load the file");
        println!("[2] Select city filter");
        println!("[3] Generate dashboard\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => handle_select_filter(),
            "3" => {
                println!();
                handle_generate_dashboard();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
