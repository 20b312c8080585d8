use crate::models::{FileHeader, ImportSpec};
use tree_sitter::{Node, Parser};

use super::ParserError;

/// Reads the header (package clause and import declarations) of Go source
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParserError::InitError(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Parse the package clause and every top-level import declaration.
    ///
    /// Bodies are never inspected: syntax errors after the import block are ignored,
    /// errors inside the header fail the whole file.
    pub fn parse(&mut self, source: &str) -> Result<FileHeader, ParserError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParserError::InitError("parser returned no tree".to_string()))?;
        let root = tree.root_node();

        let mut header = FileHeader::default();
        let mut seen_package = false;

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "comment" => continue,
                "package_clause" if !seen_package => {
                    check_errors(&child)?;
                    header.package = self.package_name(&child, source)?;
                    seen_package = true;
                }
                "import_declaration" if seen_package => {
                    check_errors(&child)?;
                    self.parse_import_declaration(&child, source, &mut header.imports);
                }
                _ if !seen_package => {
                    return Err(syntax_error(&child, "expected 'package'"));
                }
                "ERROR" if self.get_node_text(&child, source).starts_with("import") => {
                    return Err(syntax_error(&child, "syntax error in import block"));
                }
                // first declaration after the imports ends the header
                _ => break,
            }
        }

        if !seen_package {
            return Err(ParserError::Syntax {
                line: 1,
                column: 1,
                message: "expected 'package'".to_string(),
            });
        }

        Ok(header)
    }

    fn package_name(&self, node: &Node, source: &str) -> Result<String, ParserError> {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "package_identifier")
            .map(|c| self.get_node_text(&c, source));

        name.filter(|n| !n.is_empty())
            .ok_or_else(|| syntax_error(node, "missing package name"))
    }

    /// Handles both `import "x"` and grouped `import ( ... )`
    fn parse_import_declaration(&self, node: &Node, source: &str, imports: &mut Vec<ImportSpec>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => self.parse_import_spec(&child, source, imports),
                "import_spec_list" => {
                    let mut list_cursor = child.walk();
                    for spec in child.named_children(&mut list_cursor) {
                        if spec.kind() == "import_spec" {
                            self.parse_import_spec(&spec, source, imports);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_import_spec(&self, node: &Node, source: &str, imports: &mut Vec<ImportSpec>) {
        let Some(path_node) = node.child_by_field_name("path") else {
            return;
        };

        let alias = node
            .child_by_field_name("name")
            .map(|n| self.get_node_text(&n, source));

        imports.push(ImportSpec {
            path: unquote_literal(&self.get_node_text(&path_node, source)),
            alias,
            line: path_node.start_position().row + 1,
            column: path_node.start_position().column + 1,
        });
    }

    fn get_node_text(&self, node: &Node, source: &str) -> String {
        source[node.byte_range()].to_string()
    }
}

/// Drop the delimiting quotes of a string literal; escapes are kept verbatim
fn unquote_literal(literal: &str) -> String {
    let mut chars = literal.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

fn check_errors(node: &Node) -> Result<(), ParserError> {
    if !node.has_error() {
        return Ok(());
    }
    match first_error(node) {
        Some(bad) => Err(syntax_error(&bad, "syntax error in file header")),
        None => Err(syntax_error(node, "syntax error in file header")),
    }
}

fn first_error<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'a>> = node.children(&mut cursor).collect();
    children
        .iter()
        .filter(|c| c.has_error())
        .find_map(|c| first_error(c))
}

fn syntax_error(node: &Node, message: &str) -> ParserError {
    let pos = node.start_position();
    ParserError::Syntax {
        line: pos.row + 1,
        column: pos.column + 1,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(header: &FileHeader) -> Vec<&str> {
        header.imports.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_single_imports() {
        let mut parser = GoParser::new().unwrap();
        let header = parser
            .parse("package p\n\nimport \"fmt\"\nimport \"os\"\n\nfunc F() {}\n")
            .unwrap();

        assert_eq!(header.package, "p");
        assert_eq!(paths(&header), ["fmt", "os"]);
        assert_eq!(header.imports[0].line, 3);
    }

    #[test]
    fn test_grouped_imports_with_aliases() {
        let mut parser = GoParser::new().unwrap();
        let src = r#"// Package p is an example.
package p

import (
	"fmt"
	_ "embed"
	. "strings"
	pb "example.com/proto/v1"
	"fmt"
)
"#;
        let header = parser.parse(src).unwrap();

        assert_eq!(paths(&header), ["fmt", "embed", "strings", "example.com/proto/v1", "fmt"]);
        assert_eq!(header.imports[0].alias, None);
        assert_eq!(header.imports[1].alias.as_deref(), Some("_"));
        assert_eq!(header.imports[2].alias.as_deref(), Some("."));
        assert_eq!(header.imports[3].alias.as_deref(), Some("pb"));
    }

    #[test]
    fn test_raw_string_import() {
        let mut parser = GoParser::new().unwrap();
        let header = parser.parse("package p\nimport `os/exec`\n").unwrap();
        assert_eq!(paths(&header), ["os/exec"]);
    }

    #[test]
    fn test_no_imports() {
        let mut parser = GoParser::new().unwrap();
        let header = parser.parse("package empty\n\nconst X = 1\n").unwrap();

        assert_eq!(header.package, "empty");
        assert!(header.imports.is_empty());
    }

    #[test]
    fn test_body_errors_are_ignored() {
        let mut parser = GoParser::new().unwrap();
        let header = parser
            .parse("package p\n\nimport \"fmt\"\n\nfunc F() { fmt.Println( }\n")
            .unwrap();
        assert_eq!(paths(&header), ["fmt"]);
    }

    #[test]
    fn test_missing_package_clause() {
        let mut parser = GoParser::new().unwrap();
        assert!(matches!(
            parser.parse("import \"fmt\"\n"),
            Err(ParserError::Syntax { .. })
        ));
        assert!(matches!(parser.parse(""), Err(ParserError::Syntax { .. })));
    }

    #[test]
    fn test_broken_import_block() {
        let mut parser = GoParser::new().unwrap();
        let result = parser.parse("package p\n\nimport (\n\t\"fmt\"\n\t\"os\n)\n");
        assert!(matches!(result, Err(ParserError::Syntax { .. })));
    }
}
