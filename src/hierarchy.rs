// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::HeaderResult;
use crate::ir::*;
use crate::span::{split_path, Name};
use log::debug;

/// Builds a new header in which dotted signal names become nested modules.
///
/// `cpu.alu.sum` in `top` turns into a signal `sum` in `top.cpu.alu`. Existing
/// scopes are kept, new ones are `module` scopes. The input is left as is.
/// Applying this twice gives the same tree as applying it once.
pub fn make_hierarchy<'a>(src: &Header<'a>) -> HeaderResult<Header<'a>> {
    let mut dst = Header::with_fields(src.fields);
    for top in src.top_modules() {
        copy_module(src, &mut dst, top, None)?;
    }
    Ok(dst)
}

fn copy_module<'a>(
    src: &Header<'a>,
    dst: &mut Header<'a>,
    module: ModuleId,
    parent: Option<ModuleId>,
) -> HeaderResult<()> {
    let m = &src[module];
    let id = dst.add_module(m.name.clone(), m.kind, parent)?;
    for child in m.children() {
        copy_module(src, dst, child, Some(id))?;
    }
    for signal in src.vars(module) {
        promote(dst, id, &src[signal], src[signal].name.clone())?;
    }
    Ok(())
}

/// Inserts `signal` under `module`, descending one module per path segment of `name`.
fn promote<'a>(
    dst: &mut Header<'a>,
    module: ModuleId,
    signal: &Signal<'a>,
    name: Name<'a>,
) -> HeaderResult<()> {
    let mut module = module;
    let mut name = name;
    while let Some((segment, rest)) = split_path(&name) {
        debug!(
            "promoting {} into {}",
            rest.escape_ascii(),
            segment.escape_ascii()
        );
        module = dst.child_or_insert(module, segment);
        name = rest;
    }
    dst.add_signal(signal.kind, signal.width, signal.symbol, name, module)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{header_part, DOTTED, NESTED};
    use crate::parser::parse_header;
    use crate::serialize::{serialize_to_vec, Style};
    use crate::span::Span;
    use std::borrow::Cow;

    #[test]
    fn dotted_names_become_modules() {
        let orig = parse_header(header_part(DOTTED).as_bytes()).unwrap();
        let h = make_hierarchy(&orig).unwrap();

        let top = h.top(b"top").unwrap();
        assert!(h[top].signal(b"clk").is_some());
        assert_eq!(h[top].num_signals(), 1);

        let cpu = h[top].child(b"cpu").unwrap();
        let temp = h[cpu].signal(b"temp").unwrap();
        assert_eq!(h[temp].symbol, "\"");
        assert_eq!(h[temp].parent, cpu);

        let alu = h.find_module([&b"top"[..], b"cpu", b"alu"]).unwrap();
        let sum = h[alu].signal(b"sum [7:0]").unwrap();
        assert_eq!(h[sum].symbol, "#");
        assert_eq!(h[sum].width, "8");
        assert_eq!(h[alu].kind, "module");

        // original stays untouched
        let orig_top = orig.top(b"top").unwrap();
        assert_eq!(orig[orig_top].num_children(), 0);
        assert_eq!(orig[orig_top].num_signals(), 3);
        assert_eq!(h.fields, orig.fields);
    }

    #[test]
    fn clk_and_cpu_alu_sum() {
        let src = "$scope module top $end
$var wire 1 ! clk $end
$var wire 1 # cpu.alu.sum $end
$upscope $end
";
        let h = make_hierarchy(&parse_header(src.as_bytes()).unwrap()).unwrap();
        let top = h.top(b"top").unwrap();
        let signals: Vec<_> = h[top].signals().map(|s| h[s].name.clone()).collect();
        assert_eq!(signals, vec![Cow::Borrowed(&b"clk"[..])]);
        let children: Vec<_> = h[top].children().map(|m| h[m].name.clone()).collect();
        assert_eq!(children, vec![Cow::Borrowed(&b"cpu"[..])]);
        let cpu = h[top].child(b"cpu").unwrap();
        assert_eq!(h[cpu].num_signals(), 0);
        let alu = h[cpu].child(b"alu").unwrap();
        assert!(h[alu].signal(b"sum").is_some());
        assert_eq!(h[alu].num_children(), 0);
    }

    #[test]
    fn idempotent() {
        let orig = parse_header(header_part(DOTTED).as_bytes()).unwrap();
        let once = make_hierarchy(&orig).unwrap();
        let twice = make_hierarchy(&once).unwrap();
        assert_eq!(once.num_modules(), twice.num_modules());
        assert_eq!(once.num_signals(), twice.num_signals());
        assert_eq!(
            serialize_to_vec(&once, Style::Indented).unwrap(),
            serialize_to_vec(&twice, Style::Indented).unwrap()
        );
    }

    #[test]
    fn existing_scopes_are_kept_and_merged() {
        let src = "$scope module top $end
$var wire 1 ! cpu.pc $end
$scope module cpu $end
$var wire 1 # ir $end
$upscope $end
$upscope $end
";
        let h = make_hierarchy(&parse_header(src.as_bytes()).unwrap()).unwrap();
        let cpu = h.find_module([&b"top"[..], b"cpu"]).unwrap();
        assert_eq!(h[cpu].num_signals(), 2);
        assert!(h[cpu].signal(b"pc").is_some());
        assert!(h[cpu].signal(b"ir").is_some());
    }

    #[test]
    fn already_hierarchical_input_is_unchanged() {
        let orig = parse_header(header_part(NESTED).as_bytes()).unwrap();
        let h = make_hierarchy(&orig).unwrap();
        assert_eq!(
            serialize_to_vec(&h, Style::Compact).unwrap(),
            serialize_to_vec(&orig, Style::Compact).unwrap()
        );
    }

    #[test]
    fn sibling_modules_are_sorted_by_name() {
        let src = "$scope module top $end
$var wire 1 ! z.a $end
$var wire 1 # b.a $end
$var wire 1 % m.a $end
$upscope $end
";
        let h = make_hierarchy(&parse_header(src.as_bytes()).unwrap()).unwrap();
        let top = h.top(b"top").unwrap();
        let names: Vec<Vec<u8>> = h[top].children().map(|m| h[m].name.to_vec()).collect();
        assert_eq!(names, vec![b"b".to_vec(), b"m".to_vec(), b"z".to_vec()]);
    }

    #[test]
    fn empty_segments_stay_leaves() {
        let src = "$scope module top $end
$var wire 1 ! .hidden $end
$var wire 1 # trailing. $end
$var wire 1 % a..b $end
$upscope $end
";
        let h = make_hierarchy(&parse_header(src.as_bytes()).unwrap()).unwrap();
        let top = h.top(b"top").unwrap();
        assert!(h[top].signal(b".hidden").is_some());
        assert!(h[top].signal(b"trailing.").is_some());
        let a = h[top].child(b"a").unwrap();
        assert!(h[a].signal(b".b").is_some());
    }

    #[test]
    fn collision_after_promotion() {
        let src = "$scope module top $end
$var wire 1 ! cpu.pc $end
$scope module cpu $end
$var wire 1 # pc $end
$upscope $end
$upscope $end
";
        let orig = parse_header(src.as_bytes()).unwrap();
        assert!(matches!(
            make_hierarchy(&orig),
            Err(crate::errors::HeaderError::DuplicateSignal { ref name, ref module, .. })
                if name == "pc" && module == "cpu"
        ));
    }

    #[test]
    fn owned_names_are_split_too() {
        let mut h = Header::default();
        let top = h
            .add_module(Cow::Borrowed(&b"top"[..]), Span::from("module"), None)
            .unwrap();
        h.add_signal(
            SignalKind::Wire,
            "1".into(),
            "!".into(),
            Cow::Owned(b"x.y".to_vec()),
            top,
        )
        .unwrap();
        let out = make_hierarchy(&h).unwrap();
        let x = out.find_module([&b"top"[..], b"x"]).unwrap();
        assert!(out[x].signal(b"y").is_some());
    }
}
