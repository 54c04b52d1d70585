use anyhow::{Context, Result};
use filter_bridge::{AliasMapper, MappingConfig, QueryData, Translator};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sea_query::{Alias, Asterisk, PostgresQueryBuilder, Query, QueryStatementWriter};
use tracing::{info, warn};

const CONFIG_FILE: &str = "field_mapping.json";
const DEFAULT_TABLE: &str = "items";

/// 创建翻译器实例，优先使用JSON配置，失败时使用默认配置
fn create_translator_with_config() -> Translator<AliasMapper> {
    match MappingConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            info!(
                aliases = config.aliases.len(),
                case = ?config.case,
                max_depth = config.max_depth,
                "成功从JSON配置文件加载字段映射"
            );
            config.translator()
        }
        Err(e) => {
            warn!("无法加载JSON配置文件 ({}), 使用默认配置", e);
            MappingConfig::default().translator()
        }
    }
}

/// 将一行JSON请求翻译为SQL并打印
fn translate_line(translator: &Translator<AliasMapper>, table: &str, line: &str) -> Result<()> {
    let data: QueryData = serde_json::from_str(line).context("无法解析JSON请求")?;

    let mut select = Query::select();
    select.column(Asterisk).from(Alias::new(table));
    translator.append_to(&mut select, &data)?;

    println!("{}", select.to_string(PostgresQueryBuilder));

    let (sql, values) = select.build(PostgresQueryBuilder);
    println!("  参数化: {}", sql);
    for (i, value) in values.0.iter().enumerate() {
        println!("  ${} = {:?}", i + 1, value);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let table = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_TABLE.to_string());
    let translator = create_translator_with_config();

    println!("--- Filter Bridge: 过滤表达式到 SQL ---");
    println!("每行输入一个JSON请求, 例如:");
    println!(
        r#"  {{"filter": {{"parameter": {{"name": "age", "kind": "gte", "value": 18}}}}, "orders": [{{"order_by": "name", "descending": true}}]}}"#
    );
    println!("Ctrl-D 退出\n");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(&format!("{}> ", table)) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                if let Err(e) = translate_line(&translator, &table, line) {
                    println!("✗ 翻译失败: {:#}", e);
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
