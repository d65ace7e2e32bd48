use clap::Parser;
use fh::SessionState;
use fh::context::keys;
use fh_cli::cli::Cli;
use fh_cli::setup;

#[test]
fn build_client_uses_store_flag() {
	let dir = tempfile::tempdir().unwrap();
	let store = dir.path().join("nested").join("store.json");
	let config = dir.path().join("fhconfig.json");
	std::fs::write(&config, r#"{ "host": "https://platform.example", "appid": "APP", "connectiontag": 1 }"#).unwrap();

	let cli = Cli::try_parse_from([
		"fh",
		"--config",
		config.to_str().unwrap(),
		"--store",
		store.to_str().unwrap(),
		"init",
	])
	.unwrap();

	let fh = setup::build_client(&cli, None).unwrap();
	assert_eq!(fh.state(), SessionState::Uninitialized);
	assert_eq!(fh.context().config().get("connectiontag"), Some("1"));

	let device = fh.context().identity().device_id();
	let persisted: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
	assert_eq!(persisted[keys::DEVICE_ID], device);
}

#[test]
fn build_client_without_config_or_host_fails() {
	let dir = tempfile::tempdir().unwrap();
	let cli = Cli::try_parse_from(["fh", "--config", dir.path().join("missing.json").to_str().unwrap(), "init"]).unwrap();
	let err = setup::build_client(&cli, None).unwrap_err();
	assert!(err.to_string().contains("not found"));
}
