//! Reference Jobs
//!
//! The methods every node and orchestrator understands out of the box:
//!
//! | method          | kind            | arguments                          | result               |
//! |-----------------|-----------------|------------------------------------|----------------------|
//! | `read_csv`      | data extraction | `database_uri`                     | dataset              |
//! | `pre_process`   | pre-processing  | `column`, `dtype`                  | dataset              |
//! | `pre_process2`  | pre-processing  | `column`, `new_column`, `offset=10`| dataset              |
//! | `sum`           | federated       | `column`                           | `{"sum"}`            |
//! | `count`         | federated       | `column`                           | `{"len"}`            |
//! | `echo`          | federated       | `input`                            | `{"echo"}`           |
//! | `federated_avg` | federated       | `column`                           | `{"len", "data"}`    |
//! | `network_probe` | federated       | `sleep=0`                          | probe report         |
//! | `central_average` | central       | `column_name`, `organizations`     | `{"average"}`        |

pub mod central;
pub mod data;
pub mod diagnostic;
pub mod partial;

use crate::executor::registry::{JobRegistry, RegistryError};
use crate::executor::types::JobSignature;

/// Registers every reference job.
pub fn register_defaults(registry: &JobRegistry) -> Result<(), RegistryError> {
    registry.register_extraction("read_csv", JobSignature::new().required("database_uri"), data::read_csv)?;
    registry.register_preprocessing(
        "pre_process",
        JobSignature::new().required("column").required("dtype"),
        data::pre_process,
    )?;
    registry.register_preprocessing(
        "pre_process2",
        JobSignature::new()
            .required("column")
            .required("new_column")
            .optional("offset"),
        data::pre_process2,
    )?;

    let column = || JobSignature::new().required("column");
    registry.register_federated("sum", column(), partial::sum)?;
    registry.register_federated("count", column(), partial::count)?;
    registry.register_federated("federated_avg", column(), partial::federated_avg)?;
    registry.register_federated("echo", JobSignature::new().required("input"), partial::echo)?;

    registry.register_diagnostic(
        "network_probe",
        JobSignature::new().optional("sleep"),
        diagnostic::network_probe,
    )?;

    registry.register_central(
        "central_average",
        JobSignature::new()
            .required("column_name")
            .optional("organizations"),
        central::central_average,
    )?;

    Ok(())
}
