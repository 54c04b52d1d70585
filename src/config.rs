//! 配置模块，负责从JSON文件加载字段映射

use crate::naming::{AliasMapper, NameCase};
use crate::translator::{Translator, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 字段映射配置错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// 字段映射配置结构
///
/// ```json
/// { "case": "snake", "aliases": { "createdAt": "created_on" }, "max_depth": 64 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// 未出现在别名表中的字段使用的大小写转换
    #[serde(default)]
    pub case: Option<NameCase>,
    /// 逻辑字段名到数据库列名的映射
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// 过滤表达式允许的最大嵌套深度
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            case: None,
            aliases: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MappingConfig {
    /// 从JSON文件加载字段映射配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        Self::from_json_str(&content).map_err(|e| {
            ConfigError::new(format!(
                "无法解析JSON配置文件 {}: {}",
                path_ref.display(),
                e.message
            ))
        })
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::new(e.to_string()))
    }

    /// 根据配置构建字段映射器
    pub fn mapper(&self) -> AliasMapper {
        let mapper = AliasMapper::new(self.aliases.clone());
        match self.case {
            Some(case) => mapper.with_fallback(case),
            None => mapper,
        }
    }

    /// 根据配置构建翻译器
    pub fn translator(&self) -> Translator<AliasMapper> {
        Translator::with_mapper(self.mapper()).max_depth(self.max_depth)
    }
}
