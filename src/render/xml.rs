//! Framework compatibility matrix XML writer
//!
//! Output layout, four-space indented:
//! `<hal>` elements in entry order, then `<kernel>` blocks, then
//! `<sepolicy>` and `<avb>`.

use vintf_types::{
    AssembledMatrix, KernelConfigKey, KernelConfigValue, KernelRequirementBlock,
    RequirementEntry, MATRIX_SCHEMA_VERSION, MATRIX_TYPE,
};

const INDENT: &str = "    ";

/// Escape text and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

struct Writer {
    buf: String,
    depth: usize,
}

impl Writer {
    fn new() -> Self {
        Self {
            buf: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.line(tag);
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(tag);
    }

    fn element(&mut self, name: &str, text: &str) {
        self.line(&format!("<{name}>{}</{name}>", escape(text)));
    }
}

fn write_hal(w: &mut Writer, entry: &RequirementEntry) {
    w.open(&format!(
        "<hal format=\"{}\" optional=\"{}\">",
        entry.format, entry.optional
    ));
    w.element("name", &entry.component_name);
    w.element("version", &entry.version_family.to_string());
    w.open("<interface>");
    w.element("name", &entry.interface_name);
    w.element("instance", &entry.instance_name);
    w.close("</interface>");
    w.close("</hal>");
}

fn value_text(value: &KernelConfigValue) -> String {
    match value {
        KernelConfigValue::Str(s) => {
            let mut quoted = String::with_capacity(s.len() + 2);
            quoted.push('"');
            for c in s.chars() {
                if matches!(c, '\\' | '"') {
                    quoted.push('\\');
                }
                quoted.push(c);
            }
            quoted.push('"');
            quoted
        }
        other => other.to_string(),
    }
}

fn write_config(w: &mut Writer, name: &str, value: &KernelConfigValue) {
    w.open("<config>");
    w.element("key", name);
    w.line(&format!(
        "<value type=\"{}\">{}</value>",
        value.type_name(),
        escape(&value_text(value))
    ));
    w.close("</config>");
}

fn write_kernel(w: &mut Writer, block: &KernelRequirementBlock) {
    w.open(&format!("<kernel version=\"{}\">", block.kernel_version));
    if let Some(arch) = block.condition {
        w.open("<conditions>");
        write_config(
            w,
            arch.condition_key(),
            &KernelConfigValue::Tristate(arch.condition_value()),
        );
        w.close("</conditions>");
    }
    for KernelConfigKey { name, value } in &block.keys {
        write_config(w, name, value);
    }
    w.close("</kernel>");
}

/// Render an assembled matrix as framework compatibility matrix XML.
pub fn render_xml(matrix: &AssembledMatrix) -> String {
    let mut w = Writer::new();

    let mut header = format!(
        "<compatibility-matrix version=\"{}\" type=\"{}\"",
        MATRIX_SCHEMA_VERSION, MATRIX_TYPE
    );
    if let Some(level) = matrix.level {
        header.push_str(&format!(" level=\"{}\"", level));
    }
    header.push('>');
    w.open(&header);

    for entry in &matrix.entries {
        write_hal(&mut w, entry);
    }
    for block in &matrix.kernel_blocks {
        write_kernel(&mut w, block);
    }

    let scalars = &matrix.scalars;
    w.open("<sepolicy>");
    w.element(
        "kernel-sepolicy-version",
        &scalars.kernel_sepolicy_version.to_string(),
    );
    w.element("sepolicy-version", &scalars.sepolicy_version.to_string());
    w.close("</sepolicy>");
    w.open("<avb>");
    w.element("vbmeta-version", &scalars.vbmeta_version.to_string());
    w.close("</avb>");

    w.close("</compatibility-matrix>");
    w.buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use vintf_types::{ArchCondition, HalFormat, KernelVersion, MatrixScalars, Tristate, Version};

    fn scalars() -> MatrixScalars {
        MatrixScalars {
            kernel_sepolicy_version: 30,
            sepolicy_version: "10000.0".parse().unwrap(),
            vbmeta_version: Version::new(1, 0),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_unresolved_matrix_has_no_level() {
        let matrix = AssembledMatrix {
            level: None,
            entries: vec![],
            kernel_blocks: vec![],
            scalars: scalars(),
        };
        let xml = render_xml(&matrix);
        assert!(xml.starts_with("<compatibility-matrix version=\"1.0\" type=\"framework\">\n"));
        assert!(xml.ends_with("</compatibility-matrix>\n"));
    }

    #[test]
    fn test_hal_layout() {
        let matrix = AssembledMatrix {
            level: Some(2),
            entries: vec![RequirementEntry {
                component_name: "android.hardware.foo".to_string(),
                format: HalFormat::Aidl,
                interface_name: "IFoo".to_string(),
                instance_name: "default".to_string(),
                version_family: "1.0-1".parse().unwrap(),
                optional: true,
                defined_at_level: 1,
            }],
            kernel_blocks: vec![],
            scalars: scalars(),
        };
        let xml = render_xml(&matrix);
        assert!(xml.contains(
            "    <hal format=\"aidl\" optional=\"true\">\n\
             \x20       <name>android.hardware.foo</name>\n\
             \x20       <version>1.0-1</version>\n\
             \x20       <interface>\n\
             \x20           <name>IFoo</name>\n\
             \x20           <instance>default</instance>\n\
             \x20       </interface>\n\
             \x20   </hal>\n"
        ));
    }

    #[test]
    fn test_kernel_value_types() {
        let matrix = AssembledMatrix {
            level: None,
            entries: vec![],
            kernel_blocks: vec![KernelRequirementBlock {
                kernel_version: KernelVersion::new(4, 9),
                condition: Some(ArchCondition::X86),
                keys: vec![
                    KernelConfigKey {
                        name: "CONFIG_HZ".to_string(),
                        value: KernelConfigValue::Int(250),
                    },
                    KernelConfigKey {
                        name: "CONFIG_CMDLINE".to_string(),
                        value: KernelConfigValue::Str("a<b".to_string()),
                    },
                    KernelConfigKey::tristate("CONFIG_M", Tristate::Module),
                ],
            }],
            scalars: scalars(),
        };
        let xml = render_xml(&matrix);
        assert!(xml.contains("<key>CONFIG_X86</key>"));
        assert!(xml.contains("<value type=\"int\">250</value>"));
        assert!(xml.contains("<value type=\"string\">&quot;a&lt;b&quot;</value>"));
        assert!(xml.contains("<value type=\"tristate\">m</value>"));
    }

    #[test]
    fn test_string_value_reads_back_through_cfg_lexer() {
        let original = "a\"b\\c";
        let quoted = value_text(&KernelConfigValue::Str(original.to_string()));
        assert_eq!(quoted, "\"a\\\"b\\\\c\"");

        let keys = crate::kernel::parse_kernel_config(&format!("CONFIG_X={}\n", quoted)).unwrap();
        assert_eq!(keys[0].value, KernelConfigValue::Str(original.to_string()));
    }
}
