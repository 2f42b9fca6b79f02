//! 注入页面的 JS 片段
//!
//! 所有外部输入都经过 JSON 编码后再拼进脚本

use serde_json::{json, Map, Value as JsonValue};

use crate::locator::Locator;

const TEXT_OF: &str =
    "const textOf = n => ((n.innerText !== undefined ? n.innerText : n.textContent) || '').trim();";

/// 求值为节点数组的 JS 表达式
fn nodes_expr(locator: &Locator) -> String {
    let expr = json!(locator.expression());
    match locator {
        Locator::XPath(_) => format!(
            "(() => {{ const snap = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; for (let i = 0; i < snap.snapshotLength; i++) {{ out.push(snap.snapshotItem(i)); }} return out; }})()",
            expr
        ),
        Locator::Css(_) => format!("Array.from(document.querySelectorAll({}))", expr),
    }
}

pub fn query_texts(locator: &Locator) -> String {
    format!(
        r#"
        (() => {{
            {text_of}
            try {{
                return {nodes}.map(textOf);
            }} catch (error) {{
                return [];
            }}
        }})()
        "#,
        text_of = TEXT_OF,
        nodes = nodes_expr(locator)
    )
}

pub fn query_tables(locator: &Locator) -> String {
    format!(
        r#"
        (() => {{
            {text_of}
            try {{
                return {nodes}
                    .filter(t => t.tagName === 'TABLE')
                    .map(t => {{
                        let ths = t.querySelectorAll('thead th');
                        if (!ths.length) {{ ths = t.querySelectorAll('th'); }}
                        let trs = t.querySelectorAll('tbody tr');
                        if (!trs.length) {{ trs = t.querySelectorAll('tr'); }}
                        return {{
                            headers: Array.from(ths).map(textOf),
                            rows: Array.from(trs)
                                .map(r => Array.from(r.querySelectorAll('td')).map(textOf))
                                .filter(r => r.length > 0),
                        }};
                    }});
            }} catch (error) {{
                return [];
            }}
        }})()
        "#,
        text_of = TEXT_OF,
        nodes = nodes_expr(locator)
    )
}

pub fn element_state(locator: &Locator) -> String {
    format!(
        r#"
        (() => {{
            try {{
                const n = {nodes}[0];
                if (!n) {{ return 'absent'; }}
                const rect = n.getBoundingClientRect();
                const style = window.getComputedStyle(n);
                const visible = rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
                return (visible && !n.disabled) ? 'interactive' : 'present';
            }} catch (error) {{
                return 'absent';
            }}
        }})()
        "#,
        nodes = nodes_expr(locator)
    )
}

/// 脚本点击，原生点击失败时使用
pub fn click(locator: &Locator) -> String {
    format!(
        r#"
        (() => {{
            const n = {nodes}[0];
            if (!n) {{ return false; }}
            n.scrollIntoView({{ block: 'center' }});
            n.click();
            return true;
        }})()
        "#,
        nodes = nodes_expr(locator)
    )
}

const PAGE_MARK: &str = "__rucLookupMark";

/// 给当前文档打上标记
pub fn mark_page() -> String {
    format!("(() => {{ window.{} = true; return true; }})()", PAGE_MARK)
}

/// 当前文档是否仍带有标记
pub fn page_marked() -> String {
    format!("window.{} === true", PAGE_MARK)
}

pub fn clear_input(field_id: &str) -> String {
    format!(
        r#"
        (() => {{
            const el = document.getElementById({id});
            if (!el) {{ return false; }}
            el.value = '';
            return true;
        }})()
        "#,
        id = json!(field_id)
    )
}

/// 构造隐藏表单并提交
pub fn direct_submit(action_path: &str, fields: &[(String, String)]) -> String {
    let inputs: Map<String, JsonValue> = fields
        .iter()
        .map(|(name, value)| (name.clone(), JsonValue::String(value.clone())))
        .collect();
    format!(
        r#"
        (() => {{
            const form = document.createElement('form');
            form.method = 'POST';
            form.action = {action};
            const inputs = {inputs};
            for (const key in inputs) {{
                const input = document.createElement('input');
                input.type = 'hidden';
                input.name = key;
                input.value = inputs[key];
                form.appendChild(input);
            }}
            document.body.appendChild(form);
            form.submit();
            return true;
        }})()
        "#,
        action = json!(action_path),
        inputs = JsonValue::Object(inputs)
    )
}
