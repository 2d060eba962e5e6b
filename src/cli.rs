// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::core::command::CustomVariable;
use crate::core::config::{DEFAULT_CONFIG_FILE, GladosConfig};
use crate::core::models::RunId;
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument, then for the
/// language of a `Glados.toml` in the current directory.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    if let Some(lang) = args.iter().find_map(|arg| arg.strip_prefix("--lang=")) {
        return lang.to_string();
    }
    if let Some(lang) = configured_language() {
        return lang;
    }
    // Fallback to system language detection
    crate::detect_locale()
}

/// The `language` of a `Glados.toml` in the current directory, if there is one.
fn configured_language() -> Option<String> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if !path.is_file() {
        return None;
    }
    GladosConfig::load(path)
        .ok()
        .map(|config| config.language)
        .filter(|lang| !lang.is_empty())
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .long("config")
        .help(t!("arg.config", locale = locale).to_string())
        .value_name("CONFIG")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

/// TestRail connection flags shared by every subcommand that talks to TestRail.
fn with_testrail_args(cmd: Command, locale: &str) -> Command {
    cmd.arg(
        Arg::new("testrail-url")
            .long("testrail-url")
            .env("TESTRAIL_URL")
            .help(t!("arg.testrail_url", locale = locale).to_string())
            .value_name("URL")
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("testrail-user")
            .long("testrail-user")
            .env("TESTRAIL_USER")
            .help(t!("arg.testrail_user", locale = locale).to_string())
            .value_name("USER")
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("testrail-key")
            .long("testrail-key")
            .env("TESTRAIL_API_KEY")
            .hide_env_values(true)
            .help(t!("arg.testrail_key", locale = locale).to_string())
            .value_name("API_KEY")
            .action(ArgAction::Set),
    )
}

fn build_run_command(locale: &str) -> Command {
    let cmd = Command::new("run")
        .about(t!("cmd.run_about", locale = locale).to_string())
        .arg(
            Arg::new("test-run-ids")
                .short('t')
                .long("test-run-ids")
                .help(t!("arg.test_run_ids", locale = locale).to_string())
                .value_name("ID")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(RunId))
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("automation-only")
                .short('a')
                .long("automation-only")
                .help(t!("arg.automation_only", locale = locale).to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("browser")
                .short('b')
                .long("browser")
                .help(t!("arg.browser", locale = locale).to_string())
                .value_name("BROWSER")
                .default_value("")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-category-filter")
                .short('c')
                .long("test-category-filter")
                .help(t!("arg.test_category_filter", locale = locale).to_string())
                .value_name("CATEGORY")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("developer-mode")
                .short('d')
                .long("developer-mode")
                .help(t!("arg.developer_mode", locale = locale).to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("environment")
                .short('e')
                .long("environment")
                .help(t!("arg.environment", locale = locale).to_string())
                .value_name("ENVIRONMENT")
                .default_value("staging")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-status-filter")
                .short('f')
                .long("test-status-filter")
                .help(t!("arg.test_status_filter", locale = locale).to_string())
                .value_name("STATUS")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("settag")
                .short('G')
                .long("settag")
                .help(t!("arg.settag", locale = locale).to_string())
                .value_name("TAG")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("jenkins-url")
                .short('j')
                .long("jenkins-url")
                .help(t!("arg.jenkins_url", locale = locale).to_string())
                .value_name("URL")
                .default_value("")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("merge-output")
                .short('m')
                .long("merge-output")
                .help(t!("arg.merge_output", locale = locale).to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("not-test-categories")
                .short('n')
                .long("not-test-categories")
                .help(t!("arg.not_test_categories", locale = locale).to_string())
                .value_name("CATEGORY")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("pool-size")
                .short('p')
                .long("pool-size")
                .help(t!("arg.pool_size", locale = locale).to_string())
                .value_name("SIZE")
                .default_value("4")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("platform")
                .long("platform")
                .help(t!("arg.platform", locale = locale).to_string())
                .value_name("PLATFORM")
                .default_value("windows")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("platform-version")
                .long("platform-version")
                .help(t!("arg.platform_version", locale = locale).to_string())
                .value_name("VERSION")
                .default_value("7")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("remote-url")
                .short('r')
                .long("remote-url")
                .help(t!("arg.remote_url", locale = locale).to_string())
                .value_name("URL")
                .default_value("")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("search-path")
                .short('s')
                .long("search-path")
                .help(t!("arg.search_path", locale = locale).to_string())
                .value_name("PATH")
                .default_value("./..")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("variable")
                .short('v')
                .long("variable")
                .help(t!("arg.variable", locale = locale).to_string())
                .value_name("NAME:VALUE")
                .value_parser(|s: &str| s.parse::<CustomVariable>().map_err(|e| e.to_string()))
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("runner")
                .short('x')
                .long("runner")
                .help(t!("arg.runner", locale = locale).to_string())
                .value_name("RUNNER")
                .default_value("robot")
                .value_parser(["robot", "pytest"])
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help(t!("arg.html", locale = locale).to_string())
                .value_name("HTML")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(config_arg(locale));
    with_testrail_args(cmd, locale)
}

fn build_report_command(locale: &str) -> Command {
    let cmd = Command::new("report")
        .about(t!("cmd.report_about", locale = locale).to_string())
        .arg(
            Arg::new("run-id")
                .long("run-id")
                .help(t!("arg.run_id", locale = locale).to_string())
                .value_name("RUN_ID")
                .required(true)
                .value_parser(clap::value_parser!(RunId))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("case-id")
                .long("case-id")
                .help(t!("arg.case_id", locale = locale).to_string())
                .value_name("CASE_ID")
                .required(true)
                .value_parser(clap::value_parser!(u64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("outcome")
                .long("outcome")
                .help(t!("arg.outcome", locale = locale).to_string())
                .value_name("OUTCOME")
                .required(true)
                .value_parser(["passed", "failed"])
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("override-status")
                .long("override-status")
                .help(t!("arg.override_status", locale = locale).to_string())
                .value_name("STATUS")
                .value_parser(["retest", "blocked", "not_applicable"])
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("comment")
                .long("comment")
                .help(t!("arg.comment", locale = locale).to_string())
                .value_name("TEXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("environment")
                .short('e')
                .long("environment")
                .help(t!("arg.environment", locale = locale).to_string())
                .value_name("ENVIRONMENT")
                .default_value("staging")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("browser")
                .short('b')
                .long("browser")
                .help(t!("arg.browser", locale = locale).to_string())
                .value_name("BROWSER")
                .default_value("none")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("browser-version")
                .long("browser-version")
                .help(t!("arg.browser_version", locale = locale).to_string())
                .value_name("VERSION")
                .default_value("")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("jenkins-url")
                .short('j')
                .long("jenkins-url")
                .help(t!("arg.jenkins_url", locale = locale).to_string())
                .value_name("URL")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .help(t!("arg.output_dir", locale = locale).to_string())
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("started-at")
                .long("started-at")
                .help(t!("arg.started_at", locale = locale).to_string())
                .value_name("EPOCH_SECONDS")
                .value_parser(clap::value_parser!(i64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("runner-name")
                .long("runner-name")
                .help(t!("arg.runner_name", locale = locale).to_string())
                .value_name("NAME")
                .default_value("Robot")
                .action(ArgAction::Set),
        )
        .arg(config_arg(locale));
    with_testrail_args(cmd, locale)
}

fn build_port_command(locale: &str) -> Command {
    let database = Arg::new("database")
        .long("database")
        .help(t!("arg.port_database", locale = locale).to_string())
        .value_name("PATH")
        .global(true)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set);

    Command::new("port")
        .about(t!("cmd.port_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg(config_arg(locale).global(true))
        .arg(database)
        .subcommand(
            Command::new("claim")
                .about(t!("cmd.port_claim_about", locale = locale).to_string())
                .arg(
                    Arg::new("testcase")
                        .long("testcase")
                        .help(t!("arg.testcase", locale = locale).to_string())
                        .value_name("NAME")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .help(t!("arg.port", locale = locale).to_string())
                        .value_name("PORT")
                        .value_parser(clap::value_parser!(u16))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("release")
                .about(t!("cmd.port_release_about", locale = locale).to_string())
                .arg(
                    Arg::new("port")
                        .long("port")
                        .help(t!("arg.port", locale = locale).to_string())
                        .value_name("PORT")
                        .required(true)
                        .value_parser(clap::value_parser!(u16))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("release-stale")
                .about(t!("cmd.port_release_stale_about", locale = locale).to_string()),
        )
        .subcommand(
            Command::new("list").about(t!("cmd.port_list_about", locale = locale).to_string()),
        )
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("glados")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(build_run_command(locale))
        .subcommand(
            Command::new("init")
                .about(t!("cmd.init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg.init_output", locale = locale).to_string())
                        .value_name("PATH")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg.force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(build_report_command(locale))
        .subcommand(build_port_command(locale))
        .subcommand(
            Command::new("device")
                .about(t!("cmd.device_about", locale = locale).to_string())
                .arg(
                    Arg::new("alias")
                        .help(t!("arg.device_alias", locale = locale).to_string())
                        .value_name("ALIAS")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
}

fn string_values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn string_value(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

/// Reads the TestRail connection flags. Missing values are filled from the config file later.
fn testrail_overrides(matches: &ArgMatches) -> commands::TestRailOverrides {
    commands::TestRailOverrides {
        url: matches.get_one::<String>("testrail-url").cloned(),
        user: matches.get_one::<String>("testrail-user").cloned(),
        api_key: matches.get_one::<String>("testrail-key").cloned(),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let args = commands::run::RunArgs {
                test_run_ids: run_matches
                    .get_many::<RunId>("test-run-ids")
                    .map(|ids| ids.copied().collect())
                    .unwrap_or_default(),
                automation_only: run_matches.get_flag("automation-only"),
                browser: string_value(run_matches, "browser"),
                test_category_filter: string_values(run_matches, "test-category-filter"),
                developer_mode: run_matches.get_flag("developer-mode"),
                environment: string_value(run_matches, "environment"),
                test_status_filter: string_values(run_matches, "test-status-filter"),
                settag: run_matches.get_one::<String>("settag").cloned(),
                jenkins_url: string_value(run_matches, "jenkins-url"),
                merge_output: run_matches.get_flag("merge-output"),
                not_test_categories: string_values(run_matches, "not-test-categories"),
                pool_size: run_matches.get_one::<usize>("pool-size").copied().unwrap_or(4),
                platform: string_value(run_matches, "platform"),
                platform_version: string_value(run_matches, "platform-version"),
                remote_url: string_value(run_matches, "remote-url"),
                search_path: string_value(run_matches, "search-path"),
                variables: run_matches
                    .get_many::<CustomVariable>("variable")
                    .map(|vars| vars.cloned().collect())
                    .unwrap_or_default(),
                runner: string_value(run_matches, "runner").parse()?,
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                config: run_matches.get_one::<PathBuf>("config").cloned(),
                testrail: testrail_overrides(run_matches),
            };
            commands::run::execute(args, &language).await?;
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            commands::init::execute(&output, init_matches.get_flag("force"), &language)?;
        }
        Some(("report", report_matches)) => {
            let args = commands::report::ReportArgs {
                run_id: report_matches.get_one::<RunId>("run-id").copied().unwrap_or_default(),
                case_id: report_matches.get_one::<u64>("case-id").copied().unwrap_or_default(),
                outcome: string_value(report_matches, "outcome"),
                override_status: report_matches.get_one::<String>("override-status").cloned(),
                comments: string_values(report_matches, "comment"),
                environment: string_value(report_matches, "environment"),
                browser: string_value(report_matches, "browser"),
                browser_version: string_value(report_matches, "browser-version"),
                jenkins_url: report_matches.get_one::<String>("jenkins-url").cloned(),
                output_dir: report_matches.get_one::<PathBuf>("output-dir").cloned(),
                started_at: report_matches.get_one::<i64>("started-at").copied(),
                runner_name: string_value(report_matches, "runner-name"),
                config: report_matches.get_one::<PathBuf>("config").cloned(),
                testrail: testrail_overrides(report_matches),
            };
            commands::report::execute(args, &language).await?;
        }
        Some(("port", port_matches)) => {
            let config = port_matches.get_one::<PathBuf>("config").cloned();
            let database = port_matches.get_one::<PathBuf>("database").cloned();
            let action = match port_matches.subcommand() {
                Some(("claim", m)) => commands::port::PortAction::Claim {
                    testcase: string_value(m, "testcase"),
                    port: m.get_one::<u16>("port").copied(),
                },
                Some(("release", m)) => commands::port::PortAction::Release {
                    port: m.get_one::<u16>("port").copied().unwrap_or_default(),
                },
                Some(("release-stale", _)) => commands::port::PortAction::ReleaseStale,
                _ => commands::port::PortAction::List,
            };
            commands::port::execute(action, config, database, &language)?;
        }
        Some(("device", device_matches)) => {
            commands::device::execute(&string_value(device_matches, "alias"), &language)?;
        }
        _ => {
            // Clap has already printed help info for a missing subcommand.
        }
    }
    Ok(())
}
