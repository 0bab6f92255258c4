//! SWC-based specifier extraction

use reloc_foundation::paths;
use reloc_plugin_api::{
    PluginApiError, PluginResult, QuoteStyle, SpecifierKind, SpecifierOccurrence, SpecifierParser,
};
use swc_common::{sync::Lrc, FileName, FilePathMapping, SourceMap, Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::debug;

/// TypeScript/JavaScript specifier parser
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptSpecifierParser;

impl TypeScriptSpecifierParser {
    pub fn new() -> Self {
        Self
    }
}

impl SpecifierParser for TypeScriptSpecifierParser {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn handles(&self, path: &str) -> bool {
        paths::source_extension(path).is_some()
    }

    fn parse_specifiers(
        &self,
        path: &str,
        content: &str,
    ) -> PluginResult<Vec<SpecifierOccurrence>> {
        // SWC drops a leading BOM, so spans count from the text after it.
        let (bom_len, text) = match content.strip_prefix('\u{feff}') {
            Some(rest) => ('\u{feff}'.len_utf8(), rest),
            None => (0, content),
        };

        let cm = Lrc::new(SourceMap::new(FilePathMapping::empty()));
        let file_name = Lrc::new(FileName::Custom(path.to_string()));
        let source_file = cm.new_source_file(file_name, text.to_string());

        let lexer = Lexer::new(
            syntax_for(path),
            Default::default(),
            StringInput::from(&*source_file),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let module = parser.parse_module().map_err(|e| {
            let span = e.span();
            let loc = cm.lookup_char_pos(span.lo);
            PluginApiError::parse_at(
                format!("{:?}", e.kind()),
                loc.line,
                loc.col_display,
            )
        })?;

        let recovered = parser.take_errors();
        if !recovered.is_empty() {
            debug!(
                path = %path,
                recovered_errors = recovered.len(),
                "Parsed with recoverable errors"
            );
        }

        let mut collector = SpecifierCollector {
            source: content,
            base: source_file.start_pos.0,
            offset: bom_len,
            found: Vec::new(),
        };
        module.visit_with(&mut collector);
        collector.found.sort_by_key(|o| o.literal.start);
        Ok(collector.found)
    }
}

/// Pick the SWC syntax from the file extension
fn syntax_for(path: &str) -> Syntax {
    match paths::source_extension(path) {
        Some(".ts") | Some(".mts") | Some(".cts") => Syntax::Typescript(TsSyntax {
            tsx: false,
            decorators: true,
            ..Default::default()
        }),
        Some(".tsx") => Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            ..Default::default()
        }),
    }
}

/// Visitor collecting the five specifier-bearing positions
struct SpecifierCollector<'a> {
    source: &'a str,
    base: u32,
    /// Bytes of `source` before the text SWC saw
    offset: usize,
    found: Vec<SpecifierOccurrence>,
}

impl SpecifierCollector<'_> {
    fn range(&self, span: Span) -> Option<std::ops::Range<usize>> {
        let start = span.lo.0.checked_sub(self.base)? as usize + self.offset;
        let end = span.hi.0.checked_sub(self.base)? as usize + self.offset;
        (start <= end && end <= self.source.len()).then_some(start..end)
    }

    fn record(&mut self, kind: SpecifierKind, literal: &Str, statement: Span) {
        let (Some(literal_range), Some(statement_range)) =
            (self.range(literal.span), self.range(statement))
        else {
            return;
        };
        let Some(raw) = self.source.get(literal_range.clone()) else {
            return;
        };
        let Some(quote) = raw.chars().next().and_then(QuoteStyle::from_char) else {
            return;
        };
        if raw.len() < 2 {
            return;
        }

        self.found.push(SpecifierOccurrence {
            kind,
            value: literal.value.to_string_lossy().into_owned(),
            literal: literal_range,
            statement: statement_range,
            quote,
        });
    }

    fn record_first_argument(&mut self, kind: SpecifierKind, call: &CallExpr) {
        if let Some(ExprOrSpread { spread: None, expr }) = call.args.first() {
            if let Expr::Lit(Lit::Str(literal)) = &**expr {
                self.record(kind, literal, call.span);
            }
        }
    }
}

impl Visit for SpecifierCollector<'_> {
    fn visit_import_decl(&mut self, node: &ImportDecl) {
        self.record(SpecifierKind::StaticImport, &node.src, node.span);
    }

    fn visit_named_export(&mut self, node: &NamedExport) {
        if let Some(src) = &node.src {
            self.record(SpecifierKind::ReExport, src, node.span);
        }
    }

    fn visit_export_all(&mut self, node: &ExportAll) {
        self.record(SpecifierKind::WildcardReExport, &node.src, node.span);
    }

    fn visit_ts_import_equals_decl(&mut self, node: &TsImportEqualsDecl) {
        if let TsModuleRef::TsExternalModuleRef(external) = &node.module_ref {
            self.record(SpecifierKind::RequireCall, &external.expr, node.span);
        }
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        match &node.callee {
            Callee::Import(_) => self.record_first_argument(SpecifierKind::DynamicImport, node),
            Callee::Expr(callee) if is_require_callee(callee) => {
                self.record_first_argument(SpecifierKind::RequireCall, node)
            }
            _ => {}
        }
        node.visit_children_with(self);
    }
}

/// `require` or `require.resolve`
fn is_require_callee(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(ident) => &*ident.sym == "require",
        Expr::Member(member) => {
            matches!(&*member.obj, Expr::Ident(obj) if &*obj.sym == "require")
                && matches!(&member.prop, MemberProp::Ident(prop) if &*prop.sym == "resolve")
        }
        _ => false,
    }
}
