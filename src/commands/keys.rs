use commonwl::navigator::{self, NavigationError};
use serde_yaml::Value;

pub fn keys(snapshot: &Value, path: &str) -> Result<Vec<String>, NavigationError> {
    navigator::keys(snapshot, path)
}
