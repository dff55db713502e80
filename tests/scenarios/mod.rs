//! Scenario-based tests for ci-runner

mod conditional_steps;
mod dependency_install;
mod end_to_end;
mod lint_policy;
mod triggers;

/// Build, lint and test a Python package on pushes and pull requests to main
pub const PYTHON_PACKAGE: &str = r#"
name: Python Package
on:
  push:
    branches: [main]
  pull_request:
    branches: [main]

steps:
  - id: setup
    name: Set up Python 3.10
    uses: setup-runtime
    with:
      version: "3.10"
      root: conda
  - id: install
    uses: install-dependencies
    with:
      packages: [flake8, pytest]
  - id: lint-errors
    name: Stop on syntax errors and undefined names
    uses: lint
    with:
      mode: fail-fast
  - id: lint-style
    name: Report style findings
    uses: lint
    with:
      mode: advisory
  - id: test
    uses: test
  - id: debug
    name: Debug failed run
    uses: debug-session
"#;
