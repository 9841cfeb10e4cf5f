use crate::domain::ports::ScriptStore;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalScriptStore {
    base_path: String,
}

impl LocalScriptStore {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl ScriptStore for LocalScriptStore {
    async fn read_script(&self, path: &str) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);
        let content = fs::read_to_string(full_path)?;
        Ok(content)
    }

    async fn write_script(&self, path: &str, content: &str) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, content)?;
        Ok(full_path.display().to_string())
    }
}
