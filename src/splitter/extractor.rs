use tracing::debug;
use tree_sitter::Node;

use super::comments::leading_comments;
use super::imports::ImportCatalog;
use super::lines::LineIndex;
use super::references::referenced_symbols;
use super::scope::{Declaration, chunk_span, classify, is_function_like, scope_of};
use super::{Chunk, ChunkKind, ExtractError, Scope, SplitterOptions, TraversalMode};
use crate::provider::{ParsedUnit, SymbolResolver};

/// Splits one parsed unit into chunks.
///
/// Construction builds the line index and import catalog; [`split`] then
/// walks the tree reading them, so nothing is mutated during traversal.
///
/// [`split`]: AstSplitter::split
pub struct AstSplitter<'a> {
    unit: &'a ParsedUnit,
    resolver: &'a dyn SymbolResolver,
    mode: TraversalMode,
    file: String,
    lines: LineIndex,
    catalog: ImportCatalog,
}

impl<'a> AstSplitter<'a> {
    pub fn new(
        unit: &'a ParsedUnit,
        resolver: &'a dyn SymbolResolver,
        options: SplitterOptions,
    ) -> Self {
        let lines = LineIndex::new(unit.source());
        let catalog = ImportCatalog::build(unit, &lines);
        Self {
            unit,
            resolver,
            mode: options.mode,
            file: unit.display_path(),
            lines,
            catalog,
        }
    }

    /// Chunks in pre-order of their declarations.
    pub fn split(&self) -> Result<Vec<Chunk>, ExtractError> {
        let mut chunks = Vec::new();
        self.visit(self.unit.root(), &mut chunks)?;
        debug!(
            "{}: {} chunks over {} lines, {} imports ({:?})",
            self.file,
            chunks.len(),
            self.lines.line_count(),
            self.catalog.records().len(),
            self.mode
        );
        Ok(chunks)
    }

    /// Pre-order walk on a cursor, so nesting depth never grows the call stack.
    fn visit(&self, root: Node<'a>, chunks: &mut Vec<Chunk>) -> Result<(), ExtractError> {
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if let Some(declaration) = classify(node) {
                self.emit(node, declaration, chunks)?;
            }

            let descend = !(self.mode == TraversalMode::Shallow && is_function_like(node));
            if descend && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Ok(());
                }
            }
        }
    }

    fn emit(
        &self,
        node: Node<'a>,
        declaration: Declaration<'a>,
        chunks: &mut Vec<Chunk>,
    ) -> Result<(), ExtractError> {
        let kind = declaration.kind();
        match declaration {
            Declaration::Function { name } => {
                // Shallow mode only reaches functions outside any function body.
                let scope = match self.mode {
                    TraversalMode::Shallow => Scope::Module,
                    TraversalMode::Deep => scope_of(node),
                };
                chunks.push(self.create_chunk(node, kind, name, scope)?);
            }
            Declaration::Class { name }
            | Declaration::Interface { name }
            | Declaration::Enum { name }
            | Declaration::TypeAlias { name } => {
                chunks.push(self.create_chunk(node, kind, name, Scope::Module)?);
            }
            Declaration::Variables { names } => {
                let scope = scope_of(node);
                if scope == Scope::Local && self.mode == TraversalMode::Shallow {
                    return Ok(());
                }
                for name in names {
                    chunks.push(self.create_chunk(node, kind, name, scope)?);
                }
            }
        }
        Ok(())
    }

    fn create_chunk(
        &self,
        node: Node<'a>,
        kind: ChunkKind,
        name: Node<'a>,
        scope: Scope,
    ) -> Result<Chunk, ExtractError> {
        let span = chunk_span(node);
        let symbol = self.text(name)?.to_string();

        let (start, end) = (span.start_byte(), span.end_byte());
        if start > end || !self.lines.contains(end) {
            return Err(ExtractError::traversal(
                self.unit.path(),
                format!("node range {start}..{end} outside source text"),
            ));
        }
        let start_line = self.lines.line_of(start);
        let end_line = self.lines.line_of(end);

        let node_text = self.text(span)?;

        let referenced = referenced_symbols(self.unit, span, self.resolver, &self.catalog);
        let imports: Vec<String> = self
            .catalog
            .required_for(&referenced)
            .into_iter()
            .map(|record| record.text.clone())
            .collect();

        let leading = leading_comments(self.unit, span);
        let import_text = imports.join("\n");
        let text = [import_text.as_str(), leading.as_str(), node_text]
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(Chunk {
            id: Chunk::make_id(&self.file, &symbol, start_line, end_line),
            symbol,
            kind,
            scope,
            start_line,
            end_line,
            text,
            imports,
            leading_comments: leading,
            referenced_symbols: referenced,
        })
    }

    fn text(&self, node: Node<'a>) -> Result<&'a str, ExtractError> {
        self.unit.text_of(node).ok_or_else(|| {
            ExtractError::traversal(
                self.unit.path(),
                format!(
                    "{} at bytes {}..{} is not valid UTF-8",
                    node.kind(),
                    node.start_byte(),
                    node.end_byte()
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::resolver::DeclarationIndex;
    use std::collections::HashSet;

    fn split_with(path: &str, source: &str, options: SplitterOptions) -> Vec<Chunk> {
        let unit = ParsedUnit::from_source(path, source.to_string()).expect("Failed to parse");
        let index = DeclarationIndex::build([&unit]);
        AstSplitter::new(&unit, &index, options)
            .split()
            .expect("Failed to split")
    }

    fn shallow(source: &str) -> Vec<Chunk> {
        split_with("src/a.ts", source, SplitterOptions::default())
    }

    fn deep(source: &str) -> Vec<Chunk> {
        split_with("src/a.ts", source, SplitterOptions::deep())
    }

    const MIXED: &str = r#"import { readFile } from 'fs/promises';
import * as path from 'path';
import Logger, { Level } from './logger';
import { unused } from './unused';

/** Where documents live. */
export const ROOT = path.join('docs');

export interface Options {
    level: Level;
}

export enum Mode { Fast, Slow }

type Callback = (err: Error | null) => void;

// Loads one document.
export async function load(name: string, opts: Options): Promise<string> {
    const full = path.join(ROOT, name);
    const log = new Logger(opts.level);
    const read = async () => {
        const raw = await readFile(full, 'utf8');
        return raw;
    };
    return read();
}

export class Store {
    private cache = new Map<string, string>();

    get(key: string, cb: Callback) {
        let hit = this.cache.get(key);
        return hit;
    }
}

if (ROOT) {
    const guarded = 1;
}
"#;

    #[test]
    fn test_single_function_with_import() {
        let chunks = shallow("import { f } from './m'; export function g() { return f(); }");
        assert_eq!(chunks.len(), 1);

        let chunk = &chunks[0];
        assert_eq!(chunk.kind, ChunkKind::Function);
        assert_eq!(chunk.symbol, "g");
        assert_eq!(chunk.scope, Scope::Module);
        assert_eq!(chunk.imports, vec!["import { f } from './m';"]);
        assert_eq!(chunk.leading_comments, "");
        assert_eq!(
            chunk.text,
            "import { f } from './m';\n\nexport function g() { return f(); }"
        );
        assert_eq!((chunk.start_line, chunk.end_line), (1, 1));
        assert_eq!(chunk.id, "src/a.ts:g:1-1");
    }

    #[test]
    fn test_declared_name_is_its_own_reference() {
        let chunks = shallow("import { f } from './m'; export function g() { return f(); }");
        assert_eq!(chunks[0].referenced_symbols, vec!["g", "f"]);

        let recursive = shallow("function fact(n: number): number { return n ? n * fact(n - 1) : 1; }");
        assert_eq!(recursive[0].referenced_symbols, vec!["fact", "n"]);
    }

    #[test]
    fn test_deep_mode_surfaces_local_variables() {
        let source = "import { f } from './m';\nexport function g() {\n  const x = 1;\n  return f();\n}\n";

        let chunks = deep(source);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].symbol.as_str(), chunks[0].kind), ("g", ChunkKind::Function));
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (2, 5));

        let x = &chunks[1];
        assert_eq!((x.symbol.as_str(), x.kind, x.scope), ("x", ChunkKind::Variable, Scope::Local));
        assert_eq!((x.start_line, x.end_line), (3, 3));
        assert!(x.imports.is_empty());
        assert_eq!(x.text, "const x = 1;");

        assert_eq!(shallow(source).len(), 1);
    }

    #[test]
    fn test_lone_type_alias() {
        let chunks = shallow("type T = string;");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Type);
        assert!(chunks[0].imports.is_empty());
        assert_eq!(chunks[0].leading_comments, "");
        assert_eq!(chunks[0].text, "type T = string;");
    }

    #[test]
    fn test_mixed_file_shallow() {
        let chunks = shallow(MIXED);
        let summary: Vec<(&str, ChunkKind)> =
            chunks.iter().map(|c| (c.symbol.as_str(), c.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("ROOT", ChunkKind::Variable),
                ("Options", ChunkKind::Interface),
                ("Mode", ChunkKind::Enum),
                ("Callback", ChunkKind::Type),
                ("load", ChunkKind::Function),
                ("Store", ChunkKind::Class),
            ]
        );

        let root = &chunks[0];
        assert_eq!(root.imports, vec!["import * as path from 'path';"]);
        assert_eq!(root.leading_comments, "/** Where documents live. */");
        assert_eq!(
            root.text,
            "import * as path from 'path';\n\n/** Where documents live. */\n\nexport const ROOT = path.join('docs');"
        );

        let load = &chunks[4];
        assert_eq!(load.leading_comments, "// Loads one document.");
        assert_eq!(
            load.imports,
            vec![
                "import { readFile } from 'fs/promises';",
                "import * as path from 'path';",
                "import Logger, { Level } from './logger';",
            ]
        );
        assert!(load.text.starts_with("import { readFile }"));
        assert!(load.text.ends_with("return read();\n}"));

        let options = &chunks[1];
        assert_eq!(options.imports, vec!["import Logger, { Level } from './logger';"]);

        assert!(chunks.iter().all(|c| !c.text.contains("./unused")));
    }

    #[test]
    fn test_mixed_file_deep() {
        let chunks = deep(MIXED);
        let locals: Vec<&str> = chunks
            .iter()
            .filter(|c| c.scope == Scope::Local)
            .map(|c| c.symbol.as_str())
            .collect();
        assert_eq!(locals, vec!["full", "log", "read", "raw", "hit", "guarded"]);

        let raw = chunks.iter().find(|c| c.symbol == "raw").expect("raw chunk");
        assert_eq!(raw.imports, vec!["import { readFile } from 'fs/promises';"]);
    }

    #[test]
    fn test_shallow_is_subset_of_deep_and_never_local() {
        let shallow_chunks = shallow(MIXED);
        let deep_ids: HashSet<String> = deep(MIXED).into_iter().map(|c| c.id).collect();

        for chunk in &shallow_chunks {
            assert_eq!(chunk.scope, Scope::Module, "{} leaked a local", chunk.id);
            assert!(deep_ids.contains(&chunk.id), "{} missing from deep", chunk.id);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        assert_eq!(deep(MIXED), deep(MIXED));
        assert_eq!(shallow(MIXED), shallow(MIXED));
    }

    #[test]
    fn test_line_spans_and_ids_are_valid() {
        let total_lines = LineIndex::new(MIXED).line_count();
        let chunks = deep(MIXED);
        let mut ids = HashSet::new();
        for chunk in &chunks {
            assert!(1 <= chunk.start_line, "{}", chunk.id);
            assert!(chunk.start_line <= chunk.end_line, "{}", chunk.id);
            assert!(chunk.end_line <= total_lines, "{}", chunk.id);
            assert!(ids.insert(chunk.id.clone()), "duplicate id {}", chunk.id);
        }
    }

    #[test]
    fn test_imports_are_minimal_and_sufficient() {
        let unit = ParsedUnit::from_source("src/a.ts", MIXED.to_string()).expect("Failed to parse");
        let catalog = ImportCatalog::build(&unit, &LineIndex::new(MIXED));
        let index = DeclarationIndex::build([&unit]);
        let chunks = AstSplitter::new(&unit, &index, SplitterOptions::deep())
            .split()
            .expect("Failed to split");

        for chunk in &chunks {
            for name in &chunk.referenced_symbols {
                let providers: Vec<_> = catalog
                    .records()
                    .iter()
                    .filter(|r| r.names.contains(name))
                    .collect();
                if !providers.is_empty() {
                    assert!(
                        providers.iter().any(|r| chunk.imports.contains(&r.text)),
                        "{} lacks an import for {name}",
                        chunk.id
                    );
                }
            }
            for import in &chunk.imports {
                let record = catalog
                    .records()
                    .iter()
                    .find(|r| &r.text == import)
                    .expect("import comes from the catalog");
                assert!(
                    record.names.iter().any(|n| chunk.referenced_symbols.contains(n)),
                    "{} carries unneeded {import}",
                    chunk.id
                );
            }
        }
    }

    #[test]
    fn test_each_declarator_gets_a_chunk() {
        let chunks = shallow("import { v } from './v';\nexport const a = v, b = 2, { c } = obj;\n");
        let symbols: Vec<&str> = chunks.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["a", "b"]);
        assert_eq!(chunks[0].text, chunks[1].text);
        assert_ne!(chunks[0].id, chunks[1].id);
        assert_eq!(chunks[1].imports, vec!["import { v } from './v';"]);
    }

    #[test]
    fn test_namespace_members_are_module_scoped() {
        let chunks = shallow("namespace Shapes {\n  export const unit = 1;\n  export function area() {}\n}\n");
        let summary: Vec<(&str, Scope)> =
            chunks.iter().map(|c| (c.symbol.as_str(), c.scope)).collect();
        assert_eq!(summary, vec![("unit", Scope::Module), ("area", Scope::Module)]);
    }

    #[test]
    fn test_nested_declarations_keep_kind_scope() {
        let source = "export function outer() {\n  class Inner {}\n  function helper() {}\n}\n";
        assert_eq!(shallow(source).len(), 1);

        let chunks = deep(source);
        let summary: Vec<(&str, ChunkKind, Scope)> = chunks
            .iter()
            .map(|c| (c.symbol.as_str(), c.kind, c.scope))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("outer", ChunkKind::Function, Scope::Module),
                ("Inner", ChunkKind::Class, Scope::Module),
                ("helper", ChunkKind::Function, Scope::Local),
            ]
        );
    }

    #[test]
    fn test_block_and_global_declarations_in_shallow_mode() {
        let source = r#"if (typeof window !== 'undefined') {
    function onLoad() {}
    class Widget {}
    const flag = true;
}

declare global {
    interface Window { docgen: string; }
}
"#;
        let chunks = shallow(source);
        let summary: Vec<(&str, ChunkKind, Scope)> = chunks
            .iter()
            .map(|c| (c.symbol.as_str(), c.kind, c.scope))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("onLoad", ChunkKind::Function, Scope::Module),
                ("Widget", ChunkKind::Class, Scope::Module),
                ("Window", ChunkKind::Interface, Scope::Module),
            ]
        );

        let deep_flag = deep(source)
            .into_iter()
            .find(|c| c.symbol == "flag")
            .expect("flag is emitted in deep mode");
        assert_eq!(deep_flag.scope, Scope::Local);
    }

    #[test]
    fn test_overloads_and_ambient_functions() {
        let chunks = shallow(
            "export function over(a: string): string;\nexport function over(a: number): number;\nexport function over(a: any) {\n  return a;\n}\ndeclare function ext(x: number): void;\n",
        );
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "src/a.ts:over:1-1",
                "src/a.ts:over:2-2",
                "src/a.ts:over:3-5",
                "src/a.ts:ext:6-6",
            ]
        );
        assert!(chunks.iter().all(|c| c.kind == ChunkKind::Function));
        assert_eq!(chunks[0].text, "export function over(a: string): string;");
        assert_eq!(chunks[3].text, "declare function ext(x: number): void;");
    }

    #[test]
    fn test_for_loop_counter_is_not_a_chunk() {
        let chunks = deep("export function g() {\n  for (let i = 0; i < 3; i++) {}\n}\n");
        let symbols: Vec<&str> = chunks.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["g"]);
    }

    #[test]
    fn test_deeply_nested_expression_does_not_exhaust_stack() {
        let depth = 20_000;
        let source = format!(
            "export const x = {}1{};\n",
            "[".repeat(depth),
            "]".repeat(depth)
        );
        for chunks in [shallow(&source), deep(&source)] {
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].symbol, "x");
            assert_eq!(chunks[0].id, "src/a.ts:x:1-1");
        }
    }

    #[test]
    fn test_javascript_source() {
        let chunks = split_with(
            "src/util.js",
            "import lodash from 'lodash';\n\nexport class Queue {}\nexport const pick = (o) => lodash.pick(o);\n",
            SplitterOptions::default(),
        );
        let symbols: Vec<&str> = chunks.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["Queue", "pick"]);
        assert_eq!(chunks[1].imports, vec!["import lodash from 'lodash';"]);
        assert_eq!(chunks[1].id, "src/util.js:pick:4-4");
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        assert!(shallow("").is_empty());
        assert!(shallow("// only a comment\n").is_empty());
    }

    #[test]
    fn test_chunk_serializes_with_camel_case_fields() {
        let chunks = shallow("type T = string;");
        let json = serde_json::to_value(&chunks[0]).expect("serialize");
        assert_eq!(json["kind"], "type");
        assert_eq!(json["scope"], "module");
        assert_eq!(json["startLine"], 1);
        assert_eq!(json["leadingComments"], "");
        assert!(json["referencedSymbols"].is_array());
    }
}
