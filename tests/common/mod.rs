#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use contract_summaries::SummaryConfig;
use tempfile::TempDir;

pub const SPENDING_HEADER: &str = "owner_org,vendor_normalized,category,it_subcategory,fiscal_year_short,daily_contract_value,daily_contract_value_constant";

/// The two-row scenario: Vendor A, org X, category P, 2021 and 2022.
pub const TWO_ROWS: &[&str] = &[
    "X,Vendor A,P,,2021,100,90",
    "X,Vendor A,P,,2022,200,180",
];

pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub output: PathBuf,
}

impl TestEnv {
    pub fn new(rows: &[&str]) -> Self {
        Self::with_orgs(rows, &["X,True,False", "D,False,True"])
    }

    pub fn with_orgs(rows: &[&str], orgs: &[&str]) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();

        let mut spending = String::from(SPENDING_HEADER);
        for row in rows {
            spending.push('\n');
            spending.push_str(row);
        }
        spending.push('\n');
        fs::write(root.join("spending.csv"), spending).expect("write spending");

        let mut owner_orgs = String::from("owner_org,is_core,is_dnd");
        for org in orgs {
            owner_orgs.push('\n');
            owner_orgs.push_str(org);
        }
        owner_orgs.push('\n');
        fs::write(root.join("owner_orgs.csv"), owner_orgs).expect("write owner orgs");

        let output = root.join("out");
        let config_path = root.join("contract-summaries.toml");
        fs::write(
            &config_path,
            format!(
                "[paths]\n\
                 spending = '{}'\n\
                 owner_orgs = '{}'\n\
                 output = '{}'\n\
                 \n\
                 [coverage]\n\
                 start_fiscal_year = 2021\n\
                 end_fiscal_year = 2022\n\
                 \n\
                 [vendors]\n\
                 annual_threshold = 100.0\n\
                 recent_years = 1\n",
                root.join("spending.csv").display(),
                root.join("owner_orgs.csv").display(),
                output.display(),
            ),
        )
        .expect("write config");

        Self {
            _tmp: tmp,
            root,
            config_path,
            output,
        }
    }

    pub fn config(&self) -> SummaryConfig {
        SummaryConfig::load(&self.config_path).expect("load config")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("contract-summaries").expect("binary built");
        cmd.arg("--config").arg(&self.config_path).env_remove("RUST_LOG");
        cmd
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.output.join(relative))
            .unwrap_or_else(|e| panic!("read {relative}: {e}"))
    }
}

/// Every file under `dir`, keyed by path relative to `dir`.
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(dir, dir, &mut files);
    files
}

fn collect(base: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(base, &path, files);
        } else {
            let relative = path.strip_prefix(base).expect("under base").to_path_buf();
            files.insert(relative, fs::read(&path).expect("read file"));
        }
    }
}
