//! 命令行边界测试：缺少凭据、参数个数错误

#[cfg(test)]
mod tests {
    use std::process::Command;

    const CREDENTIAL_ENVS: [&str; 6] = [
        "SERPAPI_API_KEY",
        "GCLOUD_PROJECT",
        "GOOGLE_OAUTH_ACCESS_TOKEN",
        "GOOGLE_APPLICATION_CREDENTIALS",
        "GCLOUD_AUTH_APPLICATION_DEFAULT_CLIENT_ID",
        "OPENAI_API_KEY",
    ];

    fn claimcheck() -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_claimcheck"));
        for key in CREDENTIAL_ENVS {
            cmd.env_remove(key);
        }
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn stderr_json(output: &std::process::Output) -> serde_json::Value {
        let stderr = String::from_utf8_lossy(&output.stderr);
        serde_json::from_str(stderr.trim()).unwrap()
    }

    #[test]
    fn test_missing_credentials_fail_before_network() {
        let output = claimcheck()
            .args(["The moon is made of cheese", "", "none"])
            .env("GOOGLE_OAUTH_ACCESS_TOKEN", "tok")
            .env("GCLOUD_PROJECT", "proj")
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());
        let payload = stderr_json(&output);
        assert_eq!(payload["error"], "Initialization Failed");
        assert_eq!(payload["phase"], "start");
        assert!(payload["details"].as_str().unwrap().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn test_wrong_argument_count_is_json_error() {
        let output = claimcheck().args(["only a claim"]).output().unwrap();
        assert_eq!(output.status.code(), Some(1));
        let payload = stderr_json(&output);
        assert_eq!(payload["error"], "Initialization Failed");
        assert!(payload["details"].as_str().unwrap().contains("Invalid arguments"));
    }

    #[test]
    fn test_hyphen_leading_claim_reaches_credential_check() {
        let output = claimcheck()
            .args(["-40 degrees in Chicago today", "-", "none"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
        let payload = stderr_json(&output);
        assert_eq!(payload["error"], "Initialization Failed");
        let details = payload["details"].as_str().unwrap();
        assert!(!details.contains("Invalid arguments"));
        assert!(details.contains("Credentials not found") || details.contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn test_missing_config_file_is_initialization_failure() {
        let output = claimcheck()
            .args(["--config", "/nonexistent/claimcheck.toml", "claim", "", "none"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
        let payload = stderr_json(&output);
        assert_eq!(payload["error"], "Initialization Failed");
        assert!(payload["details"]
            .as_str()
            .unwrap()
            .contains("failed to load configuration"));
    }
}
