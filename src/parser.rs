// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::{HeaderError, HeaderResult};
use crate::ir::*;
use crate::span::{Span, DELIMITERS};
use crate::token::{token_at, Param, ParamReader};
use log::{debug, warn};

/// Parses a complete VCD header held in `buf`.
///
/// Every span in the result points into `buf`; nothing is copied.
pub fn parse_header(buf: &[u8]) -> HeaderResult<Header<'_>> {
    let mut parser = HeaderParser {
        reader: ParamReader::new(buf),
        header: Header::default(),
    };
    parser.parse_records(None)?;
    Ok(parser.header)
}

struct HeaderParser<'a> {
    reader: ParamReader<'a>,
    header: Header<'a>,
}

/// How a scope body ended.
enum ScopeEnd {
    Upscope,
    Eof,
}

impl<'a> HeaderParser<'a> {
    /// Consumes records until the `$upscope` closing `scope`, or until the end of the
    /// buffer at the top level.
    fn parse_records(&mut self, scope: Option<ModuleId>) -> HeaderResult<ScopeEnd> {
        while let Some(param) = self.reader.next_param()? {
            let key = param.key.as_bytes();
            if let Some(field) = Field::from_key(key) {
                self.header.fields.set(field, param.value, param.range())?;
                continue;
            }
            match key {
                b"$scope" => self.parse_scope(&param, scope)?,
                b"$var" => self.parse_var(&param, scope)?,
                b"$upscope" => {
                    if scope.is_none() {
                        return Err(HeaderError::UnmatchedUpscope {
                            range: param.range(),
                        });
                    }
                    return Ok(ScopeEnd::Upscope);
                }
                b"$enddefinitions" => {}
                _ => warn!("unsupported header record {} '{}'", param.key, param.value),
            }
        }
        Ok(ScopeEnd::Eof)
    }

    fn parse_scope(&mut self, param: &Param<'a>, parent: Option<ModuleId>) -> HeaderResult<()> {
        let value = param.value.as_bytes();
        let malformed = || HeaderError::MalformedScope {
            range: param.range(),
        };
        let kind = token_at(value, 0, DELIMITERS).ok_or_else(malformed)?;
        let name = token_at(value, kind.end, DELIMITERS).ok_or_else(malformed)?;
        let name = Span::new(&value[name.start..]).chomp();

        let id = self
            .header
            .add_module(name.to_name(), Span::new(&value[kind]), parent)
            .map_err(|e| match e {
                HeaderError::DuplicateModule { name, .. } => HeaderError::DuplicateModule {
                    name,
                    range: Some(param.range()),
                },
                other => other,
            })?;
        debug!("entering scope {name}");

        match self.parse_records(Some(id))? {
            ScopeEnd::Upscope => Ok(()),
            ScopeEnd::Eof => Err(HeaderError::UnclosedScope {
                name: name.to_string(),
                range: param.range(),
            }),
        }
    }

    fn parse_var(&mut self, param: &Param<'a>, scope: Option<ModuleId>) -> HeaderResult<()> {
        let value = param.value.as_bytes();
        let range = param.range();
        let Some(scope) = scope else {
            warn!("skipping $var outside of any scope '{}'", param.value);
            return Ok(());
        };

        let next = |offset: usize, reason: &'static str| {
            token_at(value, offset, DELIMITERS).ok_or(HeaderError::MalformedVar { reason, range })
        };
        let kind_tok = next(0, "missing signal kind")?;
        let width = next(kind_tok.end, "missing width")?;
        let symbol = next(width.end, "missing symbol")?;
        let name = next(symbol.end, "missing name")?;

        let kind = SignalKind::from_token(&value[kind_tok.clone()]).ok_or_else(|| {
            HeaderError::UnknownSignalKind {
                kind: value[kind_tok.clone()].escape_ascii().to_string(),
                range,
            }
        })?;
        // names may carry a bit range, e.g. `data [7:0]`
        let name = Span::new(&value[name.start..]).chomp();

        self.header
            .add_signal(
                kind,
                Span::new(&value[width]),
                Span::new(&value[symbol]),
                name.to_name(),
                scope,
            )
            .map_err(|e| match e {
                HeaderError::DuplicateSignal { name, module, .. } => {
                    HeaderError::DuplicateSignal {
                        name,
                        module,
                        range: Some(range),
                    }
                }
                other => other,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{header_part, DOTTED};

    fn parse(s: &str) -> HeaderResult<Header<'_>> {
        parse_header(s.as_bytes())
    }

    #[test]
    fn parse_fields_and_signals() {
        let h = parse(header_part(DOTTED)).unwrap();
        assert_eq!(h.fields.get(Field::Date), "\tMon Oct 19 12:00:00 2026");
        assert_eq!(h.fields.get(Field::Version), "\tExample Simulator 1.0");
        assert_eq!(h.fields.get(Field::Timescale), "\t1ps");
        assert_eq!(h.fields.get(Field::Comment), "first line\n\nthird line");

        let top = h.top(b"top").unwrap();
        assert_eq!(h[top].kind, "module");
        assert_eq!(h[top].num_signals(), 3);
        assert_eq!(h[top].num_children(), 0);

        let sum = h[top].signal(b"cpu.alu.sum [7:0]").unwrap();
        assert_eq!(h[sum].kind, SignalKind::Wire);
        assert_eq!(h[sum].width, "8");
        assert_eq!(h[sum].symbol, "#");

        let temp = h[top].signal(b"cpu.temp").unwrap();
        assert_eq!(h[temp].kind, SignalKind::Real);
        assert_eq!(h[temp].width, "64");
    }

    #[test]
    fn spans_point_into_the_buffer() {
        let h = parse(header_part(DOTTED)).unwrap();
        let top = h.top(b"top").unwrap();
        let clk = h[top].signal(b"clk").unwrap();
        let offset = h[clk].symbol.offset_in(DOTTED.as_bytes()).unwrap();
        assert_eq!(&DOTTED[offset..offset + 7], "! clk $");
    }

    #[test]
    fn nested_scopes() {
        let src = "$scope module top $end
  $var wire 1 ! clk $end
  $scope module cpu $end
    $scope task alu $end
      $var wire 4 # sum $end
    $upscope $end
  $upscope $end
$upscope $end
$scope module other $end $upscope $end
$enddefinitions $end
";
        let h = parse(src).unwrap();
        assert_eq!(h.top_modules().count(), 2);
        let alu = h
            .find_module([&b"top"[..], b"cpu", b"alu"])
            .expect("alu should exist");
        assert_eq!(h[alu].kind, "task");
        assert!(h[alu].signal(b"sum").is_some());
        let cpu = h[alu].parent.unwrap();
        assert_eq!(&*h[cpu].name, b"cpu");
        assert_eq!(h[h[cpu].parent.unwrap()].name, h[h.top(b"top").unwrap()].name);
    }

    #[test]
    fn unsupported_records_are_skipped() {
        let src = "$attrbegin misc 07 foo 1 $end
$scope module top $end
$dumpvars 1 $end
$var wire 1 ! clk $end
$upscope $end
";
        let h = parse(src).unwrap();
        let top = h.top(b"top").unwrap();
        assert_eq!(h[top].num_signals(), 1);
    }

    #[test]
    fn fields_inside_a_scope_are_kept() {
        let src = "$scope module top $end $comment inner $end $upscope $end";
        let h = parse(src).unwrap();
        assert_eq!(h.fields.get(Field::Comment), "inner");
    }

    #[test]
    fn last_record_without_trailing_newline() {
        let h = parse("$scope module t $end $var real 64 ! r $end $upscope $end").unwrap();
        assert_eq!(h.num_signals(), 1);
    }

    #[test]
    fn duplicate_field() {
        let err = parse("$date a $end\n$date b $end\n").unwrap_err();
        assert_eq!(
            err,
            HeaderError::DuplicateField {
                field: "$date",
                range: (13, 25)
            }
        );
    }

    #[test]
    fn duplicate_signal() {
        let src = "$scope module top $end
$var wire 1 ! a $end
$var wire 1 # a $end
$upscope $end
";
        let err = parse(src).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::DuplicateSignal { ref name, ref module, range: Some((44, 64)) }
                if name == "a" && module == "top"
        ));
    }

    #[test]
    fn duplicate_module() {
        let src = "$scope module a $end $upscope $end $scope module a $end $upscope $end";
        assert!(matches!(
            parse(src).unwrap_err(),
            HeaderError::DuplicateModule { range: Some(_), .. }
        ));
    }

    #[test]
    fn unknown_signal_kind() {
        let src = "$scope module top $end $var reg 1 ! r $end $upscope $end";
        assert!(matches!(
            parse(src).unwrap_err(),
            HeaderError::UnknownSignalKind { ref kind, .. } if kind == "reg"
        ));
    }

    #[test]
    fn malformed_var() {
        let src = "$scope module top $end $var wire 1 ! $end $upscope $end";
        assert!(matches!(
            parse(src).unwrap_err(),
            HeaderError::MalformedVar {
                reason: "missing name",
                ..
            }
        ));
    }

    #[test]
    fn var_outside_scope_is_skipped() {
        let src = "$var wire 1 ! x $end
$scope module t $end
$var wire 1 # y $end
$upscope $end
$enddefinitions $end
";
        let h = parse(src).unwrap();
        assert_eq!(h.num_signals(), 1);
        let t = h.top(b"t").unwrap();
        assert!(h[t].signal(b"x").is_none());
        assert!(h[t].signal(b"y").is_some());
    }

    #[test]
    fn malformed_scope() {
        assert!(matches!(
            parse("$scope module $end").unwrap_err(),
            HeaderError::MalformedScope { .. }
        ));
    }

    #[test]
    fn unmatched_upscope() {
        assert_eq!(
            parse("$upscope $end").unwrap_err(),
            HeaderError::UnmatchedUpscope { range: (0, 13) }
        );
    }

    #[test]
    fn unclosed_scope() {
        assert!(matches!(
            parse("$scope module top $end $var wire 1 ! a $end").unwrap_err(),
            HeaderError::UnclosedScope { ref name, .. } if name == "top"
        ));
    }
}
