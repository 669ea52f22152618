//! Integration tests for initracer-proxy

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Command isolated from the user's config file
    fn proxy(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("initracer-proxy");
        cmd.env("INITRACER_PROXY_CONFIG", dir.join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        proxy(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("instrumenting man-in-the-middle proxy"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        proxy(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("initracer-proxy"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        proxy(dir.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        proxy(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[instrument]"))
            .stdout(predicate::str::contains("mode = \"observation\""));
    }

    #[test]
    fn config_init_and_set() {
        let dir = TempDir::new().unwrap();
        proxy(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        proxy(dir.path())
            .args(["config", "set", "instrument.use_cache", "true"])
            .assert()
            .success();
        proxy(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("use_cache = true"));
    }

    #[test]
    fn config_init_keeps_existing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[general]\n").unwrap();
        proxy(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[instrument\n").unwrap();
        proxy(dir.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn classify_json_body() {
        let dir = TempDir::new().unwrap();
        let body = dir.path().join("data.json");
        std::fs::write(&body, r#"{"a": 1}"#).unwrap();

        // JSON never reaches the syntax checker
        proxy(dir.path())
            .args(["classify", "--format", "plain", "-t", "application/json"])
            .arg(&body)
            .assert()
            .success()
            .stdout("unknown\n");
    }

    #[test]
    fn classify_html_as_json() {
        let dir = TempDir::new().unwrap();
        let body = dir.path().join("page.html");
        std::fs::write(&body, "\u{feff}<!DOCTYPE html><html></html>").unwrap();

        proxy(dir.path())
            .args(["classify", "--format", "json", "-t", "text/html"])
            .arg(&body)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"kind\": \"html\""))
            .stdout(predicate::str::contains("\"warnings\": []"));
    }

    #[test]
    fn cache_list_empty() {
        let dir = TempDir::new().unwrap();
        proxy(dir.path())
            .args(["cache", "list", "--cache-dir"])
            .arg(dir.path().join("cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached artifacts"));
    }

    #[test]
    fn rewrite_rejects_invalid_flow() {
        let dir = TempDir::new().unwrap();
        let flow = dir.path().join("flow.json");
        std::fs::write(&flow, "{").unwrap();
        proxy(dir.path())
            .arg("rewrite")
            .arg(&flow)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid flow"));
    }

    #[cfg(unix)]
    mod with_tools {
        use super::*;

        const FLOW: &str = r#"{
            "request": {"url": "https://a.example/app.js?sync=7"},
            "response": {
                "status_code": 200,
                "headers": [
                    ["content-type", "text/javascript"],
                    ["Content-Security-Policy", "script-src 'self'"]
                ],
                "body": {"text": "var a = 1;"}
            }
        }"#;

        /// Config whose tool prefixes `/*<mode>*/` and whose checker accepts anything
        fn write_config(dir: &Path) {
            let config = format!(
                r#"
[instrument]
use_cache = true
cache_dir = "{}"
command = ["sh", "-c", "printf '/*%s*/' \"$INITRACER_MODE\" > \"$4\"; cat >> \"$4\"", "sh"]

[syntax]
command = ["sh", "-c", "cat > /dev/null"]
"#,
                dir.join("cache").display()
            );
            std::fs::write(dir.join("config.toml"), config).unwrap();
        }

        #[test]
        fn rewrite_instruments_script() {
            let dir = TempDir::new().unwrap();
            write_config(dir.path());
            let flow = dir.path().join("flow.json");
            std::fs::write(&flow, FLOW).unwrap();

            proxy(dir.path())
                .args(["rewrite", "--mode", "coverage"])
                .arg(&flow)
                .assert()
                .success()
                .stdout(predicate::str::contains("/*coverage*/var a = 1;"))
                .stdout(predicate::str::contains(r#""url":"https://a.example/app.js""#))
                .stdout(predicate::str::contains("Content-Security-Policy").not())
                .stdout(predicate::str::contains(r#"["Access-Control-Allow-Origin","*"]"#));

            proxy(dir.path())
                .args(["cache", "list", "--format", "plain"])
                .assert()
                .success()
                .stdout(predicate::str::contains("a.example"))
                .stdout(predicate::str::contains("app.js"));
        }

        #[test]
        fn rewrite_to_directory() {
            let dir = TempDir::new().unwrap();
            write_config(dir.path());
            let flow = dir.path().join("flow.json");
            std::fs::write(&flow, FLOW).unwrap();
            let out = dir.path().join("out");

            proxy(dir.path())
                .args(["rewrite", "--out"])
                .arg(&out)
                .arg(&flow)
                .assert()
                .success()
                .stdout(predicate::str::contains("1 flow(s) written"));

            let written = std::fs::read_to_string(out.join("flow.json")).unwrap();
            assert!(written.contains("/*observation*/var a = 1;"));
        }
    }
}
