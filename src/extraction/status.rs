//! 纾困计划（Reactiva Perú / COVID-19 担保）状态

use regex::Regex;

use crate::error::SessionError;
use crate::locator::{first_match, Locator};
use crate::models::Row;
use crate::session::DocumentQuery;

/// 状态面板的字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReliefKeys {
    /// 法律依据标题中的关键字（小写）
    pub basis_marker: &'static str,
    /// 法律依据在记录中的字段名
    pub basis_key: &'static str,
}

pub const REACTIVA_KEYS: ReliefKeys = ReliefKeys {
    basis_marker: "decreto",
    basis_key: "decreto",
};

pub const COVID19_KEYS: ReliefKeys = ReliefKeys {
    basis_marker: "ley",
    basis_key: "ley",
};

fn update_date(text: &str) -> Option<String> {
    let re = Regex::new(r"(\d{2}/\d{2}/\d{4})").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 提取状态标签、更新日期和法律依据；页面没有状态标签时返回 `None`
pub async fn extract_relief_status<D>(
    doc: &mut D,
    keys: &ReliefKeys,
) -> Result<Option<Row>, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    let status = first_match(doc, &[Locator::css("span.label")])
        .await?
        .and_then(|texts| texts.into_iter().next())
        .filter(|text| !text.is_empty());
    let Some(status) = status else {
        return Ok(None);
    };

    let mut row = Row::new();
    row.insert("tiene_deuda_mayor_1_uit".to_string(), status);

    for heading in doc.query_texts(&Locator::css("h5")).await? {
        let heading = heading.trim();
        let lower = heading.to_lowercase();
        if lower.contains("actualizada al") {
            if let Some(date) = update_date(heading) {
                row.insert("fecha_actualizacion".to_string(), date);
            }
        } else if lower.contains(keys.basis_marker) {
            row.insert(keys.basis_key.to_string(), heading.to_string());
        }
    }

    Ok(Some(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::StaticDocument;

    #[tokio::test]
    async fn reads_label_date_and_decree() {
        let mut doc = StaticDocument::default()
            .with_texts(Locator::css("span.label"), &[" NO "])
            .with_texts(
                Locator::css("h5"),
                &[
                    "Información actualizada al 15/03/2024",
                    "Decreto Legislativo N° 1455",
                    "Otro título",
                ],
            );
        let row = extract_relief_status(&mut doc, &REACTIVA_KEYS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["tiene_deuda_mayor_1_uit"], "NO");
        assert_eq!(row["fecha_actualizacion"], "15/03/2024");
        assert_eq!(row["decreto"], "Decreto Legislativo N° 1455");
        assert_eq!(row.len(), 3);
    }

    #[tokio::test]
    async fn covid_panel_reads_law() {
        let mut doc = StaticDocument::default()
            .with_texts(Locator::css("span.label"), &["SI"])
            .with_texts(Locator::css("h5"), &["Ley N° 31050"]);
        let row = extract_relief_status(&mut doc, &COVID19_KEYS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["ley"], "Ley N° 31050");
        assert!(!row.contains_key("fecha_actualizacion"));
    }

    #[tokio::test]
    async fn missing_label_means_absent() {
        let mut doc = StaticDocument::default().with_texts(Locator::css("h5"), &["Ley N° 31050"]);
        assert_eq!(
            extract_relief_status(&mut doc, &COVID19_KEYS).await.unwrap(),
            None
        );
    }
}
