use commonwl::navigator::{self, NavigationError};
use serde_yaml::Value;

pub fn walk(snapshot: &Value, path: &str) -> Result<Value, NavigationError> {
    navigator::get(snapshot, path).cloned()
}
