//! # Command Synthesizer / 命令合成器
//!
//! Turns the grouped tests of a run into runner invocations. Ungrouped tests
//! get one command each; every named sub-suite becomes a single command that
//! selects all of its tests. Two runner syntaxes are supported: Robot Framework
//! and pytest.
//!
//! 将一次运行的分组测试转换为运行器调用。未分组的测试各自生成一个命令；
//! 每个命名子套件生成一个选择其全部测试的命令。支持 Robot Framework 和 pytest 两种语法。

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::detect::RunProfile;
use crate::core::models::{DispatchCommand, RunId, TestCase, TestGroup};

/// Label used in output naming for tests without a suite.
pub const NO_SUITE: &str = "no_suite";

/// Timestamp format of the per-run output directory.
pub const TIMESTAMP_FORMAT: &str = "%m%d%Y_%H%M%S";

static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("static regex"));

/// Downstream test runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerKind {
    #[default]
    Robot,
    Pytest,
}

impl FromStr for RunnerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "robot" => Ok(RunnerKind::Robot),
            "pytest" => Ok(RunnerKind::Pytest),
            other => bail!("Unknown runner '{}', expected 'robot' or 'pytest'", other),
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerKind::Robot => f.write_str("robot"),
            RunnerKind::Pytest => f.write_str("pytest"),
        }
    }
}

/// A `name:value` variable forwarded to every runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomVariable {
    pub name: String,
    pub value: String,
}

impl FromStr for CustomVariable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => Ok(Self {
                name: name.trim().to_string(),
                value: value.to_string(),
            }),
            _ => bail!("Invalid variable '{}', expected name:value", s),
        }
    }
}

/// Separates a `device` variable from the rest. Its value becomes the default
/// device instead of being forwarded.
pub fn split_device_variable(variables: &[CustomVariable]) -> (Vec<CustomVariable>, Option<String>) {
    let mut device = None;
    let mut rest = Vec::new();
    for variable in variables {
        if variable.name.eq_ignore_ascii_case("device") {
            device = Some(variable.value.clone());
        } else {
            rest.push(variable.clone());
        }
    }
    (rest, device)
}

/// Makes a run name safe for the command line: non-alphanumerics become `_`,
/// runs of `_` collapse, and leading or trailing `_` are stripped.
pub fn sanitize_run_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    UNDERSCORE_RUNS
        .replace_all(&replaced, "_")
        .trim_matches('_')
        .to_string()
}

fn underscored(name: &str) -> String {
    name.replace(' ', "_")
}

/// Settings shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    pub runner: RunnerKind,
    pub program: String,
    pub working_dir: PathBuf,
    pub environment: String,
    pub remote_url: String,
    pub jenkins_url: String,
    pub search_path: String,
    pub pytest_test_root: String,
    pub output_root: PathBuf,
    /// Custom variables, with any `device` variable already removed.
    pub variables: Vec<CustomVariable>,
    pub tag: Option<String>,
    /// Formatted with [`TIMESTAMP_FORMAT`], shared by all runs of the invocation.
    pub timestamp: String,
}

/// The run a batch of commands belongs to.
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub run_id: RunId,
    /// Already sanitized with [`sanitize_run_name`].
    pub run_name: String,
    pub profile: RunProfile,
}

impl RunTarget {
    /// `<output_root>/<run>_<platform><version>[_<device>]_<browser>_<timestamp>`
    pub fn output_base(&self, options: &CommandOptions) -> PathBuf {
        options.output_root.join(format!(
            "{}_{}_{}",
            self.run_id,
            self.profile.directory_tag(),
            options.timestamp
        ))
    }
}

/// Synthesizes the commands for one run. The ungrouped bucket comes first,
/// followed by the named groups in insertion order.
pub fn synthesize(group: &TestGroup, target: &RunTarget, options: &CommandOptions) -> Vec<DispatchCommand> {
    let mut commands = Vec::with_capacity(group.command_count());

    for case in &group.ungrouped {
        commands.push(single_command(case, target, options));
    }

    for (sub_suite, cases) in &group.groups {
        if cases.is_empty() {
            continue;
        }
        commands.push(group_command(sub_suite, cases, target, options));
    }

    commands
}

fn case_test_name(case: &TestCase) -> String {
    underscored(case.test_name().unwrap_or_default())
}

fn single_command(case: &TestCase, target: &RunTarget, options: &CommandOptions) -> DispatchCommand {
    let test_name = case_test_name(case);
    let suite = underscored(case.suite_name());
    let label = if suite.is_empty() {
        format!("{}_{}", NO_SUITE, test_name)
    } else {
        format!("{}_{}", suite, test_name)
    };
    let output_dir = target.output_base(options).join(&label);

    let args = match options.runner {
        RunnerKind::Robot => {
            let mut args = vec!["-t".to_string(), test_name.clone()];
            if !suite.is_empty() {
                args.extend(["-s".to_string(), suite]);
            }
            args.extend(robot_base_variables(target, options));
            args.extend(["-v".to_string(), format!("{}_case_id:{}", test_name, case.case_id)]);
            args.extend(["-d".to_string(), output_dir.display().to_string()]);
            args.push(options.search_path.clone());
            args
        }
        RunnerKind::Pytest => {
            let mut args = vec!["-m".to_string(), "pytest".to_string()];
            if suite.is_empty() {
                args.extend(["-k".to_string(), test_name.clone(), options.pytest_test_root.clone()]);
            } else {
                args.push(format!("{suite}.py::{suite}::{test_name}"));
            }
            args.extend([
                "--test_run_id".to_string(),
                target.run_id.to_string(),
                "--test_case_id".to_string(),
                case.case_id.to_string(),
            ]);
            args.extend(pytest_base_variables(target, options));
            args
        }
    };

    DispatchCommand {
        run_id: target.run_id,
        label,
        program: options.program.clone(),
        args,
        working_dir: options.working_dir.clone(),
        output_dir,
    }
}

fn group_command(
    sub_suite: &str,
    cases: &[TestCase],
    target: &RunTarget,
    options: &CommandOptions,
) -> DispatchCommand {
    let label = underscored(sub_suite);
    let output_dir = target.output_base(options).join(&label);
    let suite = cases
        .first()
        .map(|case| underscored(case.suite_name()))
        .unwrap_or_default();
    let test_names: Vec<String> = cases.iter().map(case_test_name).collect();

    let args = match options.runner {
        RunnerKind::Robot => {
            let mut args = Vec::new();
            for name in &test_names {
                args.extend(["-t".to_string(), name.clone()]);
            }
            if !suite.is_empty() {
                args.extend(["-s".to_string(), suite]);
            }
            args.extend(robot_base_variables(target, options));
            for (name, case) in test_names.iter().zip(cases) {
                args.extend(["-v".to_string(), format!("{}_case_id:{}", name, case.case_id)]);
            }
            args.extend(["-d".to_string(), output_dir.display().to_string()]);
            args.push(options.search_path.clone());
            args
        }
        RunnerKind::Pytest => {
            let mut args = vec![
                "-m".to_string(),
                "pytest".to_string(),
                "-k".to_string(),
                test_names.join(" or "),
                options.pytest_test_root.clone(),
                "--test_run_id".to_string(),
                target.run_id.to_string(),
            ];
            args.extend(pytest_base_variables(target, options));
            for (name, case) in test_names.iter().zip(cases) {
                args.extend(["--vars".to_string(), format!("{}_case_id={}", name, case.case_id)]);
            }
            args
        }
    };

    DispatchCommand {
        run_id: target.run_id,
        label,
        program: options.program.clone(),
        args,
        working_dir: options.working_dir.clone(),
        output_dir,
    }
}

fn robot_base_variables(target: &RunTarget, options: &CommandOptions) -> Vec<String> {
    let profile = &target.profile;
    let landscape = if profile.landscape { "True" } else { "False" };
    let mut pairs = vec![
        format!("browser:{}", profile.browser),
        format!("environment:{}", options.environment),
        format!("run_id:{}", target.run_id),
        format!("run_name:{}", target.run_name),
        format!("remote:{}", options.remote_url),
        format!("jenkins_url:{}", options.jenkins_url),
        format!("landscape_mode:{}", landscape),
        format!("platformname:{}", profile.platform),
        format!("device:{}", profile.device),
    ];
    pairs.extend(options.variables.iter().map(|v| format!("{}:{}", v.name, v.value)));

    let mut args = Vec::with_capacity(pairs.len() * 2 + 4);
    for pair in pairs {
        args.push("-v".to_string());
        args.push(pair);
    }
    if let Some(tag) = &options.tag {
        args.extend(["-G".to_string(), tag.clone()]);
    }
    if let Some(version) = &profile.version {
        args.extend(["-v".to_string(), format!("version:{}", version)]);
    }
    args
}

fn pytest_base_variables(target: &RunTarget, options: &CommandOptions) -> Vec<String> {
    let mut args = vec![
        "--capture=sys".to_string(),
        "--tb=native".to_string(),
        "--env".to_string(),
        options.environment.clone(),
    ];
    if !target.profile.browser.is_empty() {
        args.push(format!("--browser={}", target.profile.browser));
    }
    for variable in &options.variables {
        args.extend(["--vars".to_string(), format!("{}={}", variable.name, variable.value)]);
    }
    if let Some(tag) = &options.tag {
        args.extend(["--vars".to_string(), format!("tag={}", tag)]);
    }
    args
}
