// Entry point and interactive console flow.
//
// The console stands in for the web dashboard:
// - Option [1] loads the account spreadsheet and the boundary GeoJSON.
// - Options [2] and [3] change the filters (dropdowns or a map click).
// - Option [4] runs one filter/aggregate/join cycle and prints it.
// - Option [5] shows the first rows of the loaded data.
use akun_report::config::Args;
use akun_report::dashboard::{run_cycle, CycleOutcome};
use akun_report::filter::{level_options, region_options, SessionState};
use akun_report::types::{Dataset, FilterSelection, KindGroup, LevelChoice, RegionChoice};
use akun_report::{geo_join, loader, output, reports, util};
use clap::Parser;
use log::{debug, info};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

// Session state for the whole interactive run: the loaded data plus the
// current filter choices. The region lives in `SessionState` so a map click
// carries over to the next cycle.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    data: Option<Dataset>,
    session: SessionState,
    level: Option<String>,
    kinds: KindGroup,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Numbered pick from `options`, with `0` meaning "all". An empty answer
/// keeps `current`.
fn pick(title: &str, all_label: &str, options: &[String], current: Option<&str>) -> Option<String> {
    println!("{}", title);
    println!("  [0] {}", all_label);
    for (i, opt) in options.iter().enumerate() {
        let marker = if Some(opt.as_str()) == current { " *" } else { "" };
        println!("  [{}] {}{}", i + 1, opt, marker);
    }
    loop {
        let answer = prompt("Enter choice");
        if answer.is_empty() {
            return current.map(str::to_string);
        }
        match answer.parse::<usize>() {
            Ok(0) => return None,
            Ok(n) if n <= options.len() => return Some(options[n - 1].clone()),
            _ => println!("Invalid choice. Please enter 0-{}.", options.len()),
        }
    }
}

fn handle_load(default_path: Option<&Path>, boundaries: &Path) {
    let hint = default_path
        .map(|p| format!("Spreadsheet path [{}]", p.display()))
        .unwrap_or_else(|| "Spreadsheet path".to_string());
    let answer = prompt(&hint);
    let path = if answer.is_empty() {
        match default_path {
            Some(p) => p.to_path_buf(),
            None => {
                println!("No file given.\n");
                return;
            }
        }
    } else {
        PathBuf::from(answer)
    };
    load_into_state(&path, boundaries);
}

fn load_into_state(path: &Path, boundaries: &Path) {
    match loader::load(path, boundaries) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows, {} kabupaten boundaries)",
                util::format_int(report.rows),
                util::format_int(report.boundaries)
            );
            if report.unrecognised_kinds > 0 {
                println!(
                    "Note: {} rows have an unrecognised account type.",
                    util::format_int(report.unrecognised_kinds)
                );
            }
            if report.blank_counters > 0 {
                println!(
                    "Info: {} blank counter cells counted as 0.",
                    util::format_int(report.blank_counters)
                );
            }
            println!();
            let mut state = state();
            let stale_level = state
                .level
                .as_ref()
                .is_some_and(|l| !level_options(&data.records).contains(l));
            if stale_level {
                state.level = None;
            }
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load data: {}\n", e);
        }
    }
}

fn handle_filters() {
    let mut state = state();
    let Some(data) = state.data.as_ref() else {
        println!("Error: No data loaded. Please load a spreadsheet first (option 1).\n");
        return;
    };
    let levels = level_options(&data.records);
    let regions = region_options(&data.records);

    let level = pick(
        "Pilih Jenjang",
        "Seluruh Jenjang",
        &levels,
        state.level.as_deref(),
    );
    let region = pick(
        "Pilih Kabupaten",
        "Seluruh Kabupaten",
        &regions,
        state.session.selected_region.as_deref(),
    );
    println!("Pilih Tipe Akun");
    for (i, kinds) in [KindGroup::Both, KindGroup::TeacherOnly, KindGroup::StaffOnly]
        .iter()
        .enumerate()
    {
        println!("  [{}] {}", i + 1, kinds.label());
    }
    let kinds = match prompt("Enter choice").as_str() {
        "1" => KindGroup::Both,
        "2" => KindGroup::TeacherOnly,
        "3" => KindGroup::StaffOnly,
        _ => state.kinds,
    };

    let dropdown = region.map_or(RegionChoice::All, RegionChoice::Region);
    state.session.resolve(Some(dropdown), None, &regions);
    state.level = level;
    state.kinds = kinds;
    println!();
}

fn handle_map_click() {
    let clicked = {
        let mut state = state();
        let Some(data) = state.data.as_ref() else {
            println!("Error: No data loaded. Please load a spreadsheet first (option 1).\n");
            return;
        };
        let answer = prompt("Click a kabupaten (name, or \"lon lat\")");
        let coords: Vec<f64> = answer
            .split_whitespace()
            .filter_map(|p| p.parse().ok())
            .collect();
        let clicked = match coords.as_slice() {
            [lon, lat] => geo_join::region_at(&data.boundaries, *lon, *lat).map(str::to_string),
            _ if answer.is_empty() => None,
            _ => Some(answer),
        };
        let Some(clicked) = clicked else {
            println!("No kabupaten at that point.\n");
            return;
        };
        let regions = region_options(&data.records);
        let choice = state.session.resolve(None, Some(clicked.as_str()), &regions);
        debug!("map click '{}' resolved to {:?}", clicked, choice);
        choice
    };
    if clicked == RegionChoice::All {
        println!("Kabupaten not found in the data; showing all kabupaten.\n");
    }
    handle_show_dashboard();
}

fn handle_show_dashboard() {
    // The cycle runs under the lock; input is handled one event at a time.
    let mut state = state();
    let AppState {
        data,
        session,
        level,
        kinds,
    } = &mut *state;
    let Some(data) = data.as_ref() else {
        println!("Error: No data loaded. Please load a spreadsheet first (option 1).\n");
        return;
    };
    let regions = region_options(&data.records);
    let selection = FilterSelection {
        region: session.resolve(None, None, &regions),
        level: level.clone().map_or(LevelChoice::All, LevelChoice::Level),
        kinds: *kinds,
    };

    match run_cycle(data, &selection) {
        CycleOutcome::NoMatch => println!("No data matches the current filters.\n"),
        CycleOutcome::Ready(dash) => output::print_dashboard(&dash),
    }
}

fn handle_raw_data(requested: usize) {
    let state = state();
    let Some(data) = state.data.as_ref() else {
        println!("Error: No data loaded. Please load a spreadsheet first (option 1).\n");
        return;
    };
    println!("Seluruh Data (Raw)");
    output::print_raw(reports::preview(&data.records, requested), data.records.len());
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Boundary dataset: {}", args.boundaries.display());

    if let Some(path) = &args.data {
        load_into_state(path, &args.boundaries);
    }

    loop {
        println!("Dashboard Aktivasi Akun Belajar.id Provinsi Lampung");
        println!("[1] Load spreadsheet");
        println!("[2] Choose filters");
        println!("[3] Click map region");
        println!("[4] Show dashboard");
        println!("[5] Show raw data");
        println!("[0] Exit\n");
        match prompt("Enter choice").as_str() {
            "1" => handle_load(args.data.as_deref(), &args.boundaries),
            "2" => handle_filters(),
            "3" => handle_map_click(),
            "4" => {
                println!();
                handle_show_dashboard();
            }
            "5" => handle_raw_data(args.preview_rows),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-5.\n"),
        }
    }
}
