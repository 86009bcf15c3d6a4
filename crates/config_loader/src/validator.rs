//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (page_size, max_records, mock 参数) 由 `validator` derive 规则检查
//! - fixture 数据源必须提供 path
//! - group 查询必须提供 group_id
//! - from <= to
//! - sink 名称非空且唯一

use std::collections::HashSet;

use contracts::{ContractError, DashboardConfig, Scope, SourceKind};
use ::validator::Validate;

/// 校验 DashboardConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DashboardConfig) -> Result<(), ContractError> {
    validate_field_rules(config)?;
    validate_source(config)?;
    validate_query(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// 执行 derive 规则，报告第一个字段错误
fn validate_field_rules(config: &DashboardConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let message = errors.to_string();
        let field = message
            .split(':')
            .next()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("config")
            .to_string();
        ContractError::config_validation(field, message)
    })
}

/// 校验数据源配置
fn validate_source(config: &DashboardConfig) -> Result<(), ContractError> {
    let source = &config.source;
    if source.kind == SourceKind::Fixture {
        let has_path = source
            .path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if !has_path {
            return Err(ContractError::config_validation(
                "source.path",
                "fixture source requires a dataset path",
            ));
        }
    }
    Ok(())
}

/// 校验默认查询
fn validate_query(config: &DashboardConfig) -> Result<(), ContractError> {
    let query = &config.query;

    let has_group = query
        .group_id
        .as_deref()
        .is_some_and(|g| !g.trim().is_empty());
    if query.scope == Scope::Group && !has_group {
        return Err(ContractError::missing_parameter("query.group_id"));
    }

    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ContractError::config_validation(
                "query.from / query.to",
                format!("from ({from}) must be <= to ({to})"),
            ));
        }
    }

    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(config: &DashboardConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}
