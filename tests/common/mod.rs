use std::{fs, path::Path};

use tempfile::TempDir;

/// Two stores, two families, ten consecutive days starting 2017-01-01.
///
/// Sales of store `s`, family index `f` on day `d` (0-based) are
/// `100 * s + 10 * f + d`.
pub fn train_csv() -> String {
    let families = ["BEVERAGES", "AUTOMOTIVE"];
    let mut out = String::from("id,date,store_nbr,family,sales,onpromotion\n");
    let mut id = 0;
    for day in 0..10 {
        for store in 1..=2 {
            for (f, family) in families.iter().enumerate() {
                let sales = 100 * store + 10 * f as i64 + day;
                out.push_str(&format!(
                    "{id},2017-01-{:02},{store},{family},{sales}.0,0\n",
                    day + 1
                ));
                id += 1;
            }
        }
    }
    out
}

pub const STORES_CSV: &str = "store_nbr,city,state,type,cluster\n\
1,Quito,Pichincha,D,13\n\
2,Guayaquil,Guayas,A,6\n";

// 2017-01-03 has no price
pub const OIL_CSV: &str = "date,dcoilwtico\n\
2017-01-01,52.36\n\
2017-01-02,52.36\n\
2017-01-03,\n\
2017-01-04,53.26\n\
2017-01-05,53.77\n\
2017-01-06,53.98\n\
2017-01-09,51.95\n\
2017-01-10,50.82\n";

// 2017-01-01 appears twice, 2017-02-14 is outside the train range
pub const HOLIDAYS_CSV: &str = "date,type,locale,locale_name,description,transferred\n\
2017-01-01,Holiday,National,Ecuador,Primer dia del ano,False\n\
2017-01-01,Event,National,Ecuador,Dup,False\n\
2017-01-06,Holiday,Local,Quito,Fiesta,False\n\
2017-02-14,Event,National,Ecuador,San Valentin,False\n";

pub fn transactions_csv() -> String {
    let mut out = String::from("date,store_nbr,transactions\n");
    for day in 1..=10 {
        for store in 1..=2 {
            // Store 2 reports nothing on the 5th
            if store == 2 && day == 5 {
                continue;
            }
            out.push_str(&format!("2017-01-{day:02},{store},{}\n", 1000 * store + day));
        }
    }
    out
}

pub fn write_inputs(dir: &Path) {
    fs::write(dir.join("train.csv"), train_csv()).expect("Failed to write train.csv");
    fs::write(dir.join("stores.csv"), STORES_CSV).expect("Failed to write stores.csv");
    fs::write(dir.join("oil.csv"), OIL_CSV).expect("Failed to write oil.csv");
    fs::write(dir.join("holidays_events.csv"), HOLIDAYS_CSV)
        .expect("Failed to write holidays_events.csv");
    fs::write(dir.join("transactions.csv"), transactions_csv())
        .expect("Failed to write transactions.csv");
}

pub fn input_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_inputs(dir.path());
    dir
}
