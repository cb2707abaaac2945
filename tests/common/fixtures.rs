//! Stand-in executables and source trees
//!
//! The scripts accept the same arguments as ParPar and Nyuu, append every
//! invocation to a log file and create the files the real tools would.

use std::fs;
use std::path::{Path, PathBuf};

/// Receipt written by the fake posting tool
pub const FAKE_NZB: &str = "<nzb/>\n";

/// Write an executable shell script
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path.to_path_buf()
}

/// Fake ParPar
///
/// Writes `<out>.par2` and `<out>.vol00+01.par2` into its working directory.
/// Exits 1 without writing anything when `<out>` is in `fail`.
#[cfg(unix)]
pub fn fake_parpar(dir: &Path, log: &Path, fail: &[&str]) -> PathBuf {
    let fail_case = case_arm("out", fail, "exit 1");
    write_script(
        &dir.join("parpar"),
        &format!(
            r#"echo "$@" >> "{log}"
prev=""
out=""
for arg in "$@"; do
  if [ "$prev" = "--out" ]; then out="$arg"; fi
  prev="$arg"
done
{fail_case}
echo par2 > "$out.par2"
echo par2 > "$out.vol00+01.par2"
exit 0
"#,
            log = log.display()
        ),
    )
}

/// Fake Nyuu
///
/// Uploads write the receipt named by `--out` into the working directory and
/// exit with `exit_code`, or exit 5 without a receipt when the receipt name is
/// in `fail`. Reposts delete the article, or exit 1 and keep it when its file
/// name is in `fail_raw`.
#[cfg(unix)]
pub fn fake_nyuu(dir: &Path, log: &Path, exit_code: i32, fail: &[&str], fail_raw: &[&str]) -> PathBuf {
    let fail_case = case_arm("out", fail, "exit 5");
    let fail_raw_case = case_arm("name", fail_raw, "exit 1");
    write_script(
        &dir.join("nyuu"),
        &format!(
            r#"echo "$@" >> "{log}"
prev=""
out=""
raw=""
for arg in "$@"; do
  if [ "$prev" = "--out" ]; then out="$arg"; fi
  if [ "$prev" = "--input-raw-posts" ]; then raw="$arg"; fi
  prev="$arg"
done
if [ -n "$raw" ]; then
  name=$(basename "$raw")
  {fail_raw_case}
  rm -f "$raw"
  exit 0
fi
{fail_case}
printf '{nzb}' > "$out"
exit {exit_code}
"#,
            log = log.display(),
            nzb = FAKE_NZB.replace('\n', "\\n"),
        ),
    )
}

/// `case "$<var>" in a|b) <action>;; esac`, or nothing for an empty list
fn case_arm(var: &str, names: &[&str], action: &str) -> String {
    if names.is_empty() {
        return String::new();
    }
    format!("case \"${var}\" in {}) {action};; esac", names.join("|"))
}

/// Create `relative` under `root` holding `len` bytes
pub fn write_file(root: &Path, relative: &str, len: usize) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, vec![b'x'; len]).expect("Failed to write file");
    path
}

/// Nyuu JSON config naming `dump_dir` as the raw article drop directory
pub fn nyuu_config(dir: &Path, name: &str, dump_dir: &Path) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::json!({
        "host": "news.example.com",
        "dump-failed-posts": dump_dir,
    });
    fs::write(&path, json.to_string()).expect("Failed to write nyuu config");
    path
}
