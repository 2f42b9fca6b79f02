//! 基本信息提取

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::SessionError;
use crate::locator::{Locator, LocatorResolver, LocatorStrategy};
use crate::models::FieldValue;
use crate::session::DocumentQuery;

/// "RUC - 名称" 组合字段
const IDENTITY_FIELD: &str = "numero_ruc_razon_social";
const IDENTITY_LABEL: &str = "Número de RUC:";

/// 字段名 → 页面上的标签
const LABELED_FIELDS: &[(&str, &str)] = &[
    ("tipo_contribuyente", "Tipo Contribuyente:"),
    ("nombre_comercial", "Nombre Comercial:"),
    ("fecha_inscripcion", "Fecha de Inscripción:"),
    ("fecha_inicio_actividades", "Fecha de Inicio de Actividades:"),
    ("estado", "Estado del Contribuyente:"),
    ("condicion", "Condición del Contribuyente:"),
    ("direccion_fiscal", "Domicilio Fiscal:"),
    ("sistema_emision", "Sistema Emisión de Comprobante:"),
    ("actividad_comercio_exterior", "Actividad Comercio Exterior:"),
    ("sistema_contabilidad", "Sistema Contabilidad:"),
    ("emisor_electronico_desde", "Emisor electrónico desde:"),
    ("comprobantes_electronicos", "Comprobantes Electrónicos:"),
    ("afiliado_ple_desde", "Afiliado al PLE desde:"),
];

/// 以表格列出的字段
const LIST_FIELDS: &[(&str, &str)] = &[
    ("actividades_economicas", "Actividad(es) Económica(s):"),
    ("comprobantes_pago", "Comprobantes de Pago"),
];

fn labeled_strategy(field: &str, label: &str) -> LocatorStrategy {
    LocatorStrategy::new(
        field,
        vec![
            Locator::xpath(format!(
                "//h4[contains(text(), '{}')]/parent::div/following-sibling::div//p[@class='list-group-item-text']",
                label
            )),
            Locator::xpath(format!(
                "//h4[contains(text(), '{}')]/parent::div/parent::div//p[@class='list-group-item-text']",
                label
            )),
        ],
    )
}

/// 基本信息页的字段定位注册表
pub fn core_field_resolver() -> LocatorResolver {
    let mut resolver = LocatorResolver::new().register(LocatorStrategy::new(
        IDENTITY_FIELD,
        vec![Locator::xpath(format!(
            "//h4[contains(text(), '{}')]/parent::div/following-sibling::div//h4",
            IDENTITY_LABEL
        ))],
    ));
    for (field, label) in LABELED_FIELDS {
        resolver = resolver.register(labeled_strategy(field, label));
    }
    for (field, label) in LIST_FIELDS {
        resolver = resolver.register(LocatorStrategy::new(
            *field,
            vec![Locator::xpath(format!(
                "//h4[contains(text(), '{}')]/parent::div/following-sibling::div//table//tr/td",
                label
            ))],
        ));
    }
    resolver
}

/// 在第一个 " - " 处拆分组合字段
fn split_identity(composite: &str) -> (String, Option<String>) {
    match composite.split_once(" - ") {
        Some((number, name)) => (number.trim().to_string(), Some(name.trim().to_string())),
        None => (composite.trim().to_string(), None),
    }
}

/// 提取基本信息
///
/// 组合字段不存在时返回 `None`，表示结果页上没有这条记录。其余字段缺失时直接省略。
pub async fn extract_core_record<D>(
    doc: &mut D,
    resolver: &LocatorResolver,
) -> Result<Option<BTreeMap<String, FieldValue>>, SessionError>
where
    D: DocumentQuery + ?Sized,
{
    let Some(composite) = resolver.resolve_text(IDENTITY_FIELD, doc).await? else {
        return Ok(None);
    };

    let mut fields = BTreeMap::new();
    let (number, name) = split_identity(&composite);
    fields.insert("numero_ruc".to_string(), FieldValue::Text(number));
    if let Some(name) = name {
        fields.insert("razon_social".to_string(), FieldValue::Text(name));
    }

    for (field, _) in LABELED_FIELDS {
        if let Some(value) = resolver.resolve_text(field, doc).await? {
            fields.insert(field.to_string(), FieldValue::Text(value));
        }
    }
    for (field, _) in LIST_FIELDS {
        if let Some(items) = resolver.resolve_list(field, doc).await? {
            fields.insert(field.to_string(), FieldValue::List(items));
        }
    }

    debug!("基本信息提取完成，共 {} 个字段", fields.len());
    Ok(Some(fields))
}
