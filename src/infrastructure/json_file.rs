// Infrastructure: JSON file store for models
// One header file per model plus one file per group:
//   <model>.json, <model>-VARG-<group>.json, <model>-CONSTRG-<group>.json,
//   <model>-CONSTANTG-<group>.json

use crate::application::exchange::{
    ExchangeError, GroupExporter, GroupImporter, ModelExporter, ModelImporter, Result,
};
use crate::application::mappers::{
    constant_group_to_dto, constraint_group_to_dto, model_to_dto, restore_constant_group,
    restore_constraint_group, restore_model_header, restore_var_group, var_group_to_dto,
    ConstantGroupDto, ConstraintGroupDto, ModelDto, VarGroupDto,
};
use crate::domain::SolverBackend;
use crate::group::{
    ConstantGroup, ConstantKind, ConstraintGroup, ConstraintKind, GroupKind, VarGroup, VarKind,
};
use crate::model::Model;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FOLDER: &str = "./models/json/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileConfig {
    pub folder_path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(folder_path: impl Into<PathBuf>) -> Self {
        Self {
            folder_path: folder_path.into(),
        }
    }

    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.folder_path.join(format!("{}.json", model_id))
    }

    pub fn group_path<K: GroupKind>(&self, model_id: &str, group_id: &str) -> PathBuf {
        self.folder_path
            .join(format!("{}{}{}.json", model_id, K::FILE_SUFFIX, group_id))
    }
}

impl Default for JsonFileConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDER)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExchangeError + '_ {
    move |source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(io_error(path))?;
    tracing::debug!(
        component = "json_file",
        operation = "write",
        path = %path.display(),
        "File written"
    );
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&json).map_err(|source| ExchangeError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes models into the configured folder, creating it when absent
#[derive(Debug, Clone, Default)]
pub struct JsonFileExporter {
    config: JsonFileConfig,
}

impl JsonFileExporter {
    pub fn new(config: JsonFileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JsonFileConfig {
        &self.config
    }

    fn prepare_folder(&self) -> Result<()> {
        let folder = &self.config.folder_path;
        if folder.exists() {
            if !folder.is_dir() {
                return Err(ExchangeError::InvalidFolder(folder.clone()));
            }
            return Ok(());
        }
        fs::create_dir_all(folder).map_err(io_error(folder))
    }
}

impl<B: SolverBackend> ModelExporter<B> for JsonFileExporter {
    fn export_model(&self, model: &Model<B>) -> Result<()> {
        self.prepare_folder()?;
        let header = model_to_dto(model);
        write_json(&self.config.model_path(model.identifier()), &header)?;

        for id in &header.constant_groups {
            self.export_group(model, &model.constant_group(id)?)?;
        }
        for id in &header.variable_groups {
            self.export_group(model, &model.var_group(id)?)?;
        }
        for id in &header.constraint_groups {
            self.export_group(model, &model.constraint_group(id)?)?;
        }

        tracing::info!(
            component = "json_file",
            operation = "export_model",
            model = model.identifier(),
            folder = %self.config.folder_path.display(),
            "Model exported"
        );
        Ok(())
    }
}

impl<B: SolverBackend> GroupExporter<B, VarKind> for JsonFileExporter {
    fn export_group(&self, model: &Model<B>, group: &VarGroup) -> Result<()> {
        self.prepare_folder()?;
        let dto = var_group_to_dto(model, group)?;
        let path = self
            .config
            .group_path::<VarKind>(model.identifier(), group.identifier());
        write_json(&path, &dto)
    }
}

impl<B: SolverBackend> GroupExporter<B, ConstraintKind> for JsonFileExporter {
    fn export_group(&self, model: &Model<B>, group: &ConstraintGroup) -> Result<()> {
        self.prepare_folder()?;
        let dto = constraint_group_to_dto(model, group)?;
        let path = self
            .config
            .group_path::<ConstraintKind>(model.identifier(), group.identifier());
        write_json(&path, &dto)
    }
}

impl<B: SolverBackend> GroupExporter<B, ConstantKind> for JsonFileExporter {
    fn export_group(&self, model: &Model<B>, group: &ConstantGroup) -> Result<()> {
        self.prepare_folder()?;
        let dto = constant_group_to_dto(model, group)?;
        let path = self
            .config
            .group_path::<ConstantKind>(model.identifier(), group.identifier());
        write_json(&path, &dto)
    }
}

/// Reads models back from the configured folder
#[derive(Debug, Clone, Default)]
pub struct JsonFileImporter {
    config: JsonFileConfig,
}

impl JsonFileImporter {
    pub fn new(config: JsonFileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JsonFileConfig {
        &self.config
    }

    fn check_folder(&self) -> Result<()> {
        if self.config.folder_path.is_dir() {
            Ok(())
        } else {
            Err(ExchangeError::InvalidFolder(self.config.folder_path.clone()))
        }
    }
}

impl<B: SolverBackend> ModelImporter<B> for JsonFileImporter {
    fn import_model(&self, model: &Model<B>) -> Result<()> {
        self.check_folder()?;
        let header: ModelDto = read_json(&self.config.model_path(model.identifier()))?;

        for id in &header.constant_groups {
            GroupImporter::<B, ConstantKind>::import_group(self, model, id)?;
        }
        for id in &header.variable_groups {
            GroupImporter::<B, VarKind>::import_group(self, model, id)?;
        }
        for id in &header.constraint_groups {
            GroupImporter::<B, ConstraintKind>::import_group(self, model, id)?;
        }
        restore_model_header(model, &header)?;

        tracing::info!(
            component = "json_file",
            operation = "import_model",
            model = model.identifier(),
            folder = %self.config.folder_path.display(),
            "Model imported"
        );
        Ok(())
    }
}

impl<B: SolverBackend> GroupImporter<B, VarKind> for JsonFileImporter {
    fn import_group(&self, model: &Model<B>, group_id: &str) -> Result<()> {
        self.check_folder()?;
        let path = self
            .config
            .group_path::<VarKind>(model.identifier(), group_id);
        let dto: VarGroupDto = read_json(&path)?;
        Ok(restore_var_group(model, &dto)?)
    }
}

impl<B: SolverBackend> GroupImporter<B, ConstraintKind> for JsonFileImporter {
    fn import_group(&self, model: &Model<B>, group_id: &str) -> Result<()> {
        self.check_folder()?;
        let path = self
            .config
            .group_path::<ConstraintKind>(model.identifier(), group_id);
        let dto: ConstraintGroupDto = read_json(&path)?;
        Ok(restore_constraint_group(model, &dto)?)
    }
}

impl<B: SolverBackend> GroupImporter<B, ConstantKind> for JsonFileImporter {
    fn import_group(&self, model: &Model<B>, group_id: &str) -> Result<()> {
        self.check_folder()?;
        let path = self
            .config
            .group_path::<ConstantKind>(model.identifier(), group_id);
        let dto: ConstantGroupDto = read_json(&path)?;
        Ok(restore_constant_group(model, &dto)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_the_group_suffixes() {
        let config = JsonFileConfig::new("/tmp/store");
        assert_eq!(
            config.model_path("M"),
            PathBuf::from("/tmp/store/M.json")
        );
        assert_eq!(
            config.group_path::<VarKind>("M", "Picks"),
            PathBuf::from("/tmp/store/M-VARG-Picks.json")
        );
        assert_eq!(
            config.group_path::<ConstraintKind>("M", "Caps"),
            PathBuf::from("/tmp/store/M-CONSTRG-Caps.json")
        );
        assert_eq!(
            config.group_path::<ConstantKind>("M", "Costs"),
            PathBuf::from("/tmp/store/M-CONSTANTG-Costs.json")
        );
    }

    #[test]
    fn default_folder() {
        assert_eq!(
            JsonFileConfig::default().folder_path,
            PathBuf::from("./models/json/")
        );
    }
}
