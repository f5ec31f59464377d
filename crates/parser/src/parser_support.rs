use crate::ast::{self, Span};

/// One comma-separated entry of a parameter list, before grouping.
///
/// `(a, b int)` arrives as `[a]` then `[b int]`; `(int, string)` as two lone names.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub name: Option<ast::IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

/// Groups parameter entries into fields.
///
/// If any entry carries both a name and a type, lone names are grouped with the next typed
/// entry. Otherwise every entry is an anonymous parameter and lone names are type names.
/// On a malformed list the span of the offending entry is returned.
pub fn resolve_param_list(
    arena: &mut ast::AstArena,
    params: Vec<ParamDecl>,
) -> Result<Vec<ast::FieldId>, Span> {
    let named = params.iter().any(|p| p.name.is_some() && p.typ.is_some());
    let mut out = Vec::with_capacity(params.len());

    if !named {
        for param in params {
            let typ = match (param.typ, param.name) {
                (Some(typ), _) => typ,
                (None, Some(name)) => named_type_from_ident(arena, name),
                (None, None) => return Err(param.span),
            };
            let field = ast::Field {
                names: ast::ListRef::EMPTY,
                ellipsis_pos: param.ellipsis_pos,
                typ,
                tag: None,
                is_embed: false,
            };
            out.push(arena.fields.alloc(field, param.span));
        }
        return Ok(out);
    }

    let mut pending_names: Vec<ast::IdentName> = Vec::new();
    let mut pending_start: Option<u32> = None;

    for param in params {
        match (param.name, param.typ) {
            (Some(name), None) => {
                pending_start.get_or_insert(param.span.start);
                pending_names.push(name);
            }
            (Some(name), Some(typ)) => {
                pending_names.push(name);
                let names = arena.list_ident_names(pending_names.drain(..));
                let span = Span {
                    start: pending_start.take().unwrap_or(param.span.start),
                    end: param.span.end,
                };
                let field = ast::Field {
                    names,
                    ellipsis_pos: param.ellipsis_pos,
                    typ,
                    tag: None,
                    is_embed: false,
                };
                out.push(arena.fields.alloc(field, span));
            }
            (None, _) => return Err(param.span),
        }
    }

    match pending_names.first() {
        Some(name) => Err(name.pos),
        None => Ok(out),
    }
}

fn named_type_from_ident(arena: &mut ast::AstArena, name: ast::IdentName) -> ast::TypeId {
    arena.types.alloc(
        ast::Type::Named {
            pkg: None,
            name,
            args: ast::ListRef::EMPTY,
        },
        name.pos,
    )
}
