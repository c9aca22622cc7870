//! Recursive descent parser (component D). One function per production in
//! the grammar; every bracket-opening construct tracks its own closer and
//! reports an `ASTError` at the cursor's current location if it never
//! arrives, the way the teacher's hand-rolled productions in `parsing.rs`
//! bubble a `ParseError` up through each combinator instead of panicking.

use crate::ast::{File, MemberDecl, ObjectDecl, TypeExpr, ValueExpr};
use crate::cursor::Cursor;
use crate::error::{LangError, LangResult};
use crate::ops::Op;
use crate::token::TokenKind;

pub fn parse_file(tokens: Vec<crate::token::Token>) -> LangResult<File> {
    let mut cur = Cursor::new(tokens);
    let mut objects = Vec::new();
    while !cur.is_at_end() {
        objects.push(parse_object_decl(&mut cur)?);
    }
    Ok(File { objects })
}

fn parse_id_list(cur: &mut Cursor) -> LangResult<Vec<String>> {
    let mut names = Vec::new();
    if cur.at(TokenKind::Id) {
        names.push(cur.advance()?.text);
        while cur.at(TokenKind::Comma) {
            cur.advance()?;
            let tok = cur.expect(TokenKind::Id)?;
            names.push(tok.text);
        }
    }
    Ok(names)
}

/// `('+' Id)` list inside an `[InhMods]` clause; the `+` is a lone
/// `Operator` token since the lexer has no dedicated "plus" kind.
fn parse_inheritance_mods(cur: &mut Cursor) -> LangResult<Vec<String>> {
    let mut names = Vec::new();
    loop {
        if !cur.at(TokenKind::Operator) {
            break;
        }
        let op_tok = cur.advance()?;
        if Op::from_str(&op_tok.text) != Op::Add {
            return Err(LangError::ast(
                op_tok.location,
                format!("only '+' is permitted in an inheritance modification list, found '{}'", op_tok.text),
            ));
        }
        let id = cur.expect(TokenKind::Id)?;
        names.push(id.text);
        if cur.at(TokenKind::Comma) {
            cur.advance()?;
            continue;
        }
        break;
    }
    Ok(names)
}

fn parse_object_decl(cur: &mut Cursor) -> LangResult<ObjectDecl> {
    let name_tok = cur.expect(TokenKind::Id)?;
    let location = name_tok.location;

    let mut patch_targets = Vec::new();
    if cur.at(TokenKind::LAngle) {
        cur.advance()?;
        patch_targets = parse_id_list(cur)?;
        cur.expect(TokenKind::RAngle)?;
    }

    let mut inheritance_add = Vec::new();
    if cur.at(TokenKind::LBracket) {
        cur.advance()?;
        inheritance_add = parse_inheritance_mods(cur)?;
        cur.expect(TokenKind::RBracket)?;
    }

    cur.expect(TokenKind::LParen)?;
    let parents = parse_id_list(cur)?;
    cur.expect(TokenKind::RParen)?;
    cur.expect(TokenKind::Colon)?;
    cur.expect(TokenKind::EndLine)?;
    cur.expect(TokenKind::Indent)?;

    let mut members = Vec::new();
    if cur.at(TokenKind::Pass) {
        cur.advance()?;
        cur.expect(TokenKind::EndLine)?;
    } else {
        members.push(parse_member_decl(cur)?);
        while !cur.at(TokenKind::Dedent) && !cur.at(TokenKind::EndFile) {
            members.push(parse_member_decl(cur)?);
        }
    }

    if cur.at(TokenKind::Dedent) {
        cur.advance()?;
    }
    // A trailing object at end-of-file with no synthesized Dedent (the
    // lexer only emits the ones still outstanding) is accepted as-is.

    Ok(ObjectDecl {
        name: name_tok.text,
        patch_targets,
        inheritance_add,
        parents,
        members,
        location,
    })
}

fn parse_member_decl(cur: &mut Cursor) -> LangResult<MemberDecl> {
    let name_tok = cur.expect(TokenKind::Id)?;
    let location = name_tok.location;

    let mut declared_type = None;
    if cur.at(TokenKind::Colon) {
        cur.advance()?;
        declared_type = Some(parse_type_expr(cur)?);
    }

    let mut operation = None;
    let mut value = None;
    if cur.at(TokenKind::Operator) {
        let op_tok = cur.advance()?;
        let op = Op::from_str(&op_tok.text);
        if !op.is_member_operation() {
            return Err(LangError::ast(
                op_tok.location,
                format!("'{}' cannot stand alone as a member operation", op_tok.text),
            ));
        }
        operation = Some(op);
        value = Some(parse_value_expr(cur)?);
    }

    if declared_type.is_none() && operation.is_none() {
        return Err(LangError::ast(
            location,
            format!("member '{}' needs a type clause, an operator-value clause, or both", name_tok.text),
        ));
    }

    cur.expect(TokenKind::EndLine)?;

    Ok(MemberDecl {
        name: name_tok.text,
        declared_type,
        operation,
        value,
        location,
    })
}

fn parse_type_expr(cur: &mut Cursor) -> LangResult<TypeExpr> {
    let name_tok = cur.expect(TokenKind::Id)?;
    let location = name_tok.location;
    let mut payload = None;
    if cur.at(TokenKind::LParen) {
        cur.advance()?;
        payload = Some(Box::new(parse_type_expr(cur)?));
        cur.expect(TokenKind::RParen)?;
    }
    Ok(TypeExpr {
        name: name_tok.text,
        payload,
        location,
    })
}

/// `value-atom | '<' (value-atom (',' value-atom)*)? '>'`. The bracketed
/// form is not in the authoritative grammar summary but is required to
/// parse set/orderedset literals such as `<1, 2, 3>` — see DESIGN.md.
fn parse_value_expr(cur: &mut Cursor) -> LangResult<ValueExpr> {
    if cur.at(TokenKind::LAngle) {
        let open = cur.advance()?;
        let mut elements = Vec::new();
        if !cur.at(TokenKind::RAngle) {
            elements.push(parse_value_atom(cur)?);
            while cur.at(TokenKind::Comma) {
                cur.advance()?;
                elements.push(parse_value_atom(cur)?);
            }
        }
        cur.expect(TokenKind::RAngle)?;
        return Ok(ValueExpr::Sequence {
            elements,
            location: open.location,
        });
    }
    parse_value_atom(cur)
}

fn parse_value_atom(cur: &mut Cursor) -> LangResult<ValueExpr> {
    let tok = cur.peek()?.clone();

    // `-inf` is the one signed form the lexer can't fold into a single
    // numeric token (unlike `-5`, its sign isn't followed by a digit): a
    // lone `-` immediately followed by the `inf` identifier is accepted
    // here and folded into one atom, the same reinterpretation spec §4.B
    // describes for `inf`/`nan` themselves.
    if tok.kind == TokenKind::Operator && tok.text == "-" {
        cur.advance()?;
        let next = cur.expect(TokenKind::Id)?;
        if next.text != "inf" {
            return Err(LangError::ast(next.location, format!("expected 'inf' after a lone '-', found '{}'", next.text)));
        }
        return Ok(ValueExpr::Scalar {
            token_kind: TokenKind::Id,
            literal_text: format!("-{}", next.text),
            location: tok.location,
        });
    }

    match tok.kind {
        TokenKind::Id | TokenKind::Int | TokenKind::Float | TokenKind::String => {
            cur.advance()?;
            Ok(ValueExpr::Scalar {
                token_kind: tok.kind,
                literal_text: tok.text,
                location: tok.location,
            })
        }
        other => Err(LangError::ast(tok.location, format!("expected a value, found {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LexConfig;
    use crate::lexer::Lexer;
    use crate::source::SourceRegistry;

    fn parse(src: &str) -> LangResult<File> {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", src);
        let tokens = Lexer::new(LexConfig::default()).tokenize(&reg, id)?;
        parse_file(tokens)
    }

    #[test]
    fn parses_primitive_member_and_patch() {
        let file = parse("First():\n    member : int = 17\nFirstPatch<First>():\n    member += 7\n").unwrap();
        assert_eq!(file.objects.len(), 2);
        assert_eq!(file.objects[0].name, "First");
        assert_eq!(file.objects[0].members[0].name, "member");
        assert_eq!(file.objects[1].patch_targets, vec!["First".to_string()]);
        assert_eq!(file.objects[1].members[0].operation, Some(Op::AddAssign));
    }

    #[test]
    fn parses_pass_body() {
        let file = parse("A():\n    pass\n").unwrap();
        assert!(file.objects[0].members.is_empty());
    }

    #[test]
    fn parses_container_type_and_sequence_literal() {
        let file = parse("Base():\n    m : orderedset(int) = <1, 2, 3>\n").unwrap();
        let m = &file.objects[0].members[0];
        let t = m.declared_type.as_ref().unwrap();
        assert_eq!(t.name, "orderedset");
        assert_eq!(t.payload.as_ref().unwrap().name, "int");
        match m.value.as_ref().unwrap() {
            ValueExpr::Sequence { elements, .. } => assert_eq!(elements.len(), 3),
            _ => panic!("expected a sequence literal"),
        }
    }

    #[test]
    fn parses_inheritance_mods() {
        let file = parse("P<Base>[+Extra]():\n    pass\n").unwrap();
        assert_eq!(file.objects[0].inheritance_add, vec!["Extra".to_string()]);
    }

    #[test]
    fn member_with_neither_type_nor_value_is_an_error() {
        let err = parse("A():\n    m\n").unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Ast);
    }

    #[test]
    fn bad_inheritance_operator_is_rejected() {
        let err = parse("P<Base>[-Extra]():\n    pass\n").unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Ast);
    }

    #[test]
    fn bare_additive_operator_cannot_stand_alone_in_a_member() {
        let err = parse("A():\n    k : int + 1\n").unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Ast);
    }
}
