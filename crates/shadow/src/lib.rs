// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shadow executors (§4.4, §5): run `js`/`node`/`python`/`sh` executable
//! bodies with parameter marshaling in and JSON-aware return-value
//! demarshaling out, each call a fresh subprocess so no VM context or
//! timer outlives a single invocation.

mod executor;
mod fake;
mod marshal;
mod process;
mod registry;
mod script;

pub use executor::{demarshal_stdout, ExecRequest, ShadowExecutor};
pub use fake::{FakeResponse, FakeShadowExecutor};
pub use marshal::{bind_params, metadata_table, to_shadow_json, to_shell_string, type_name, BoundParam, ParamTypeInfo};
pub use process::{NodeExecutor, PythonExecutor, ShellExecutor};
pub use registry::{ShadowEnv, ShadowRegistry};
pub use script::{build_js_script, build_python_script, build_shell_script};
