//! 附加面板的种类与开关

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::ConfigError;

/// 附加面板种类
///
/// 序列化名称即记录中的字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PanelKind {
    /// 员工人数
    #[serde(rename = "cantidad_trabajadores")]
    Workforce,
    /// 法定代表人
    #[serde(rename = "representantes_legales")]
    LegalRepresentatives,
    /// 历史信息
    #[serde(rename = "informacion_historica")]
    History,
    /// 强制执行债务
    #[serde(rename = "deuda_coactiva")]
    CoerciveDebt,
    /// Reactiva Perú 纾困计划
    #[serde(rename = "reactiva_peru")]
    ReactivaPeru,
    /// COVID-19 担保计划
    #[serde(rename = "programa_covid19")]
    Covid19Guarantee,
    /// 附属营业场所
    #[serde(rename = "establecimientos_anexos")]
    Branches,
}

impl PanelKind {
    pub const ALL: [PanelKind; 7] = [
        PanelKind::Workforce,
        PanelKind::LegalRepresentatives,
        PanelKind::History,
        PanelKind::CoerciveDebt,
        PanelKind::ReactivaPeru,
        PanelKind::Covid19Guarantee,
        PanelKind::Branches,
    ];

    /// 记录中的字段名
    pub fn key(self) -> &'static str {
        match self {
            PanelKind::Workforce => "cantidad_trabajadores",
            PanelKind::LegalRepresentatives => "representantes_legales",
            PanelKind::History => "informacion_historica",
            PanelKind::CoerciveDebt => "deuda_coactiva",
            PanelKind::ReactivaPeru => "reactiva_peru",
            PanelKind::Covid19Guarantee => "programa_covid19",
            PanelKind::Branches => "establecimientos_anexos",
        }
    }

    /// 日志中显示的名称
    pub fn label(self) -> &'static str {
        match self {
            PanelKind::Workforce => "员工人数",
            PanelKind::LegalRepresentatives => "法定代表人",
            PanelKind::History => "历史信息",
            PanelKind::CoerciveDebt => "强制执行债务",
            PanelKind::ReactivaPeru => "Reactiva Perú",
            PanelKind::Covid19Guarantee => "COVID-19 担保计划",
            PanelKind::Branches => "附属营业场所",
        }
    }

    /// 按名称解析，接受字段名或简写
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase().replace('-', "_");
        PanelKind::ALL.into_iter().find(|kind| {
            kind.key() == name
                || match kind {
                    PanelKind::Workforce => name == "trabajadores",
                    PanelKind::LegalRepresentatives => name == "representantes",
                    PanelKind::History => name == "historico",
                    PanelKind::CoerciveDebt => false,
                    PanelKind::ReactivaPeru => false,
                    PanelKind::Covid19Guarantee => name == "covid19",
                    PanelKind::Branches => name == "establecimientos",
                }
        })
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 要查询的附加面板集合，各开关互相独立
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelFlags {
    enabled: BTreeSet<PanelKind>,
}

impl PanelFlags {
    /// 只查询基本信息
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            enabled: PanelKind::ALL.into_iter().collect(),
        }
    }

    pub fn with(mut self, kind: PanelKind) -> Self {
        self.enabled.insert(kind);
        self
    }

    pub fn is_enabled(&self, kind: PanelKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// 按固定顺序遍历已启用的面板
    pub fn enabled(&self) -> impl Iterator<Item = PanelKind> + '_ {
        self.enabled.iter().copied()
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, ConfigError> {
        names.into_iter().try_fold(Self::none(), |flags, name| {
            PanelKind::from_name(name)
                .map(|kind| flags.with(kind))
                .ok_or_else(|| ConfigError::UnknownPanel(name.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases_resolve() {
        assert_eq!(PanelKind::from_name("trabajadores"), Some(PanelKind::Workforce));
        assert_eq!(
            PanelKind::from_name("deuda-coactiva"),
            Some(PanelKind::CoerciveDebt)
        );
        assert_eq!(
            PanelKind::from_name("ESTABLECIMIENTOS_ANEXOS"),
            Some(PanelKind::Branches)
        );
        assert_eq!(PanelKind::from_name("otro"), None);
    }

    #[test]
    fn flags_iterate_in_declaration_order() {
        let flags = PanelFlags::none()
            .with(PanelKind::Branches)
            .with(PanelKind::Workforce);
        let order: Vec<_> = flags.enabled().collect();
        assert_eq!(order, vec![PanelKind::Workforce, PanelKind::Branches]);
        assert!(!flags.is_enabled(PanelKind::History));
    }
}
