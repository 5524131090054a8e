use crate::dashboard::Dashboard;
use crate::reports::{LoginBreakdown, SchoolBreakdown};
use crate::types::{
    AccountRecord, AggregateRow, LevelChoice, LevelPivot, LoginRateRow, MapRegionRow,
    RawDisplayRow, RegionChoice, SchoolCountDisplayRow, SchoolCountRow,
};
use crate::util::{format_int, format_percent};
use tabled::{settings::Style, Table, Tabled};

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn login_rows(rows: &[AggregateRow]) -> Vec<LoginRateRow> {
    rows.iter()
        .map(|r| LoginRateRow {
            group: r.key.clone().unwrap_or_else(|| "Total".to_string()),
            logged_in: format_int(r.logged_in),
            available: format_int(r.available),
            registered: format_int(r.registered),
            percentage: format_percent(r.percentage),
        })
        .collect()
}

fn school_rows(rows: &[SchoolCountRow], pivot: Option<&LevelPivot>) -> Vec<SchoolCountDisplayRow> {
    rows.iter()
        .map(|r| {
            let breakdown = pivot
                .and_then(|p| {
                    p.rows.iter().find(|(region, _)| *region == r.key).map(|(_, counts)| {
                        p.levels
                            .iter()
                            .zip(counts)
                            .map(|(level, n)| format!("{}: {}", level, n))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                })
                .unwrap_or_default();
            SchoolCountDisplayRow {
                group: r.key.clone(),
                schools: format_int(r.schools),
                breakdown,
            }
        })
        .collect()
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print every section of a dashboard cycle to the console.
pub fn print_dashboard(dash: &Dashboard) {
    let region = match &dash.selection.region {
        RegionChoice::All => "Seluruh Kabupaten".to_string(),
        RegionChoice::Region(r) => title_case(r),
    };
    let level = match &dash.selection.level {
        LevelChoice::All => "Seluruh Jenjang",
        LevelChoice::Level(l) => l.as_str(),
    };
    println!(
        "Filter: {} | {} | {}\n",
        region,
        level,
        dash.selection.kinds.label()
    );

    println!("Rekapitulasi Data");
    println!("  Total Akun Login:             {}", format_int(dash.totals.logged_in));
    println!("  Total Akun Tersedia:          {}", format_int(dash.totals.available));
    println!("  Total Akun Terdaftar Dapodik: {}\n", format_int(dash.totals.registered));

    println!("Peta ({} kabupaten)", dash.map.rows.len());
    if let Some(rect) = dash.map_extent {
        println!(
            "(extent: lon {:.4}..{:.4}, lat {:.4}..{:.4})",
            rect.min().x,
            rect.max().x,
            rect.min().y,
            rect.max().y
        );
    }
    let map_rows: Vec<MapRegionRow> = dash
        .map
        .rows
        .iter()
        .map(|r| MapRegionRow {
            region: r.region.clone(),
            logged_in: format_int(r.logged_in),
            available: format_int(r.available),
            registered: format_int(r.registered),
            percentage: format_percent(r.percentage),
        })
        .collect();
    preview_table_rows(&map_rows, map_rows.len());

    match &dash.login {
        LoginBreakdown::ByRegion(rows) => {
            println!("Persentase Login per Kabupaten");
            preview_table_rows(&login_rows(rows), rows.len());
        }
        LoginBreakdown::ByLevel { region, rows } => {
            println!("Persentase Login per Jenjang di {}", title_case(region));
            preview_table_rows(&login_rows(rows), rows.len());
        }
        LoginBreakdown::Scalar { region, level, row } => {
            println!("Rekapitulasi Login - {} | Jenjang {}", title_case(region), level);
            println!("  Total Terdaftar:   {}", format_int(row.registered));
            println!("  Total Login:       {}", format_int(row.logged_in));
            println!("  Persentase Login:  {}\n", format_percent(row.percentage));
        }
    }

    match &dash.schools {
        SchoolBreakdown::ByRegion { total, rows, pivot } => {
            println!("Jumlah Sekolah per Kabupaten (total {})", format_int(*total));
            let display = school_rows(rows, pivot.as_ref());
            preview_table_rows(&display, display.len());
        }
        SchoolBreakdown::ByLevel { region, total, rows } => {
            println!(
                "Jumlah Sekolah di {} per Jenjang (total {})",
                title_case(region),
                format_int(*total)
            );
            let display = school_rows(rows, None);
            preview_table_rows(&display, display.len());
        }
        SchoolBreakdown::Scalar {
            region,
            level,
            schools,
        } => {
            println!(
                "Jumlah Sekolah di {} | Jenjang {}: {}\n",
                title_case(region),
                level,
                format_int(*schools)
            );
        }
    }

    if let Some(shares) = &dash.level_distribution {
        println!("Distribusi Jenjang (Total Akun Login)");
        let total: u64 = shares.iter().map(|s| s.logged_in).sum();
        for share in shares {
            let pct = if total == 0 {
                0.0
            } else {
                share.logged_in as f64 / total as f64 * 100.0
            };
            println!(
                "  {:<8} {:>10} ({})",
                share.level,
                format_int(share.logged_in),
                format_percent(pct)
            );
        }
        println!();
    }
}

/// Print the first rows of the loaded dataset.
pub fn print_raw(rows: &[AccountRecord], total: usize) {
    let display: Vec<RawDisplayRow> = rows
        .iter()
        .map(|r| RawDisplayRow {
            region: r.region.clone(),
            level: r.level.clone(),
            school: r.school.clone(),
            kind: r.kind.clone(),
            logged_in: format_int(r.logged_in),
            available: format_int(r.available),
            registered: format_int(r.registered),
        })
        .collect();
    preview_table_rows(&display, display.len());
    println!(
        "Showing {} of {} rows\n",
        format_int(display.len()),
        format_int(total)
    );
}
