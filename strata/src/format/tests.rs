use super::*;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, PartialEq, Tabled)]
struct TestData {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "VALUE")]
    value: i32,
}

impl Formattable for TestData {
    fn format_pretty(&self) -> String {
        format!("{}: {}", self.name, self.value)
    }
}

fn rows() -> Vec<TestData> {
    vec![
        TestData {
            name: "first".to_string(),
            value: 1,
        },
        TestData {
            name: "second".to_string(),
            value: 2,
        },
    ]
}

#[test]
fn test_output_format_from_string() {
    assert_eq!(OutputFormat::from("pretty"), OutputFormat::Pretty);
    assert_eq!(OutputFormat::from("json"), OutputFormat::Json);
    assert_eq!(OutputFormat::from("YML"), OutputFormat::Yaml);
    assert_eq!(OutputFormat::from("invalid"), OutputFormat::Pretty);
}

#[test]
fn test_color_choice_from_string() {
    assert_eq!(ColorChoice::from("always"), ColorChoice::Always);
    assert_eq!(ColorChoice::from("NEVER"), ColorChoice::Never);
    assert_eq!(ColorChoice::from("auto"), ColorChoice::Auto);
    assert_eq!(ColorChoice::from("bogus"), ColorChoice::Auto);
}

#[test]
fn test_color_choice_explicit_values() {
    assert!(ColorChoice::Always.enabled());
    assert!(!ColorChoice::Never.enabled());
}

#[test]
fn test_format_pretty() {
    let data = TestData {
        name: "test".to_string(),
        value: 42,
    };
    let result = format_output(&data, OutputFormat::Pretty);
    assert_eq!(result.unwrap(), "test: 42");
}

#[test]
fn test_format_json() {
    let data = TestData {
        name: "test".to_string(),
        value: 42,
    };
    let result = format_output(&data, OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(json["name"], "test");
    assert_eq!(json["value"], 42);
}

#[test]
fn test_format_yaml() {
    let data = TestData {
        name: "test".to_string(),
        value: 42,
    };
    let result = format_output(&data, OutputFormat::Yaml).unwrap();
    assert!(result.contains("name: test"));
    assert!(result.contains("value: 42"));
}

#[test]
fn test_format_table_pretty_has_headers() {
    let table = format_table(&rows(), OutputFormat::Pretty).unwrap();
    assert!(table.contains("NAME"));
    assert!(table.contains("VALUE"));
    assert!(table.contains("second"));
}

#[test]
fn test_format_table_json_is_list() {
    let json = format_table(&rows(), OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[1]["name"], "second");
}

#[test]
fn test_plain_formatter_spinner_is_hidden() {
    let formatter = PlainFormatter;
    let spinner = formatter.spinner("working");
    assert!(spinner.is_hidden());
    formatter.finish_progress(spinner, "done");
}
