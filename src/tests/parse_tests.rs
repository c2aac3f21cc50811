#[cfg(test)]
mod subtest_resolution_tests {
    use std::collections::HashSet;

    use crate::model::{SubTest, TestFunction, UNRESOLVED_NAME};
    use crate::parse::{scan_file, scan_source, ScanError};

    fn scan(code: &str) -> Vec<TestFunction> {
        scan_source("test.go", code).expect("scan should succeed")
    }

    fn leaf(name: &str) -> SubTest {
        SubTest::resolved(name, vec![])
    }

    #[test]
    fn test_function_without_run_calls_has_no_subtests() {
        let code = r#"
package foo

import "testing"

func TestA1(t *testing.T) {
	a := 1
	b := 2
	if a+b != 3 {
		t.Errorf("got %d", a+b)
	}
}
"#;
        let got = scan(code);
        assert_eq!(
            got,
            vec![TestFunction {
                name: "TestA1".to_string(),
                subs: vec![],
            }]
        );
    }

    #[test]
    fn test_literal_names_resolve_to_unquoted_text() {
        let code = r#"
package foo

import "testing"

func TestB1(t *testing.T) {
	helperFunc(t)

	t.Run("test1", func(t *testing.T) {
		if 1+2 != 3 {
			t.Fail()
		}
	})
	t.Run("test2", func(t *testing.T) {
		if 2+3 != 5 {
			t.Fail()
		}
	})
}

func helperFunc(t *testing.T) {
	t.Helper()
}
"#;
        let got = scan(code);
        assert_eq!(
            got,
            vec![TestFunction {
                name: "TestB1".to_string(),
                subs: vec![leaf("test1"), leaf("test2")],
            }]
        );
    }

    #[test]
    fn test_positional_table_rows_resolve_in_declaration_order() {
        let code = r#"
package foo

import "testing"

func TestA2(t *testing.T) {
	tests := []struct {
		name string
		a    int
		b    int
		want int
	}{
		{"test1", 1, 2, 3},
		{"test2", 2, 3, 5},
		{"test3", 3, 4, 7},
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {
			if tt.a+tt.b != tt.want {
				t.Fail()
			}
		})
	}
}
"#;
        let got = scan(code);
        assert_eq!(
            got,
            vec![TestFunction {
                name: "TestA2".to_string(),
                subs: vec![leaf("test1"), leaf("test2"), leaf("test3")],
            }]
        );
    }

    #[test]
    fn test_keyed_table_rows_resolve() {
        let code = r#"
package foo

import "testing"

func TestA2(t *testing.T) {
	tests := []struct {
		name string
		want int
	}{
		{name: "test1", want: 3},
		{name: "test2", want: 5},
		{name: "test3", want: 7},
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("test1"), leaf("test2"), leaf("test3")]);
    }

    #[test]
    fn test_named_element_type_resolves_via_keyed_rows() {
        // The element type is a named type, so there is no positional field
        // index; keyed rows still match on the key.
        let code = r#"
package foo

import "testing"

func TestA2(t *testing.T) {
	type fixture struct {
		name string
		want int
	}
	tests := []fixture{
		{name: "test1", want: 3},
		{name: "test2", want: 5},
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("test1"), leaf("test2")]);
    }

    #[test]
    fn test_var_declared_table_resolves() {
        let code = r#"
package foo

import "testing"

func TestA2(t *testing.T) {
	var tests = []struct {
		name string
		want int
	}{
		{"test1", 3},
		{"test2", 5},
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("test1"), leaf("test2")]);
    }

    #[test]
    fn test_nested_selector_receiver_stays_unresolved() {
        // tt.req.name: the receiver is itself a selector, which breaks the
        // iteration-binding lookup.
        let code = r#"
package foo

import "testing"

func TestA2(t *testing.T) {
	type reqParam struct {
		name string
	}
	tests := []struct {
		req  reqParam
		want int
	}{
		{reqParam{"test1"}, 3},
	}

	for _, tt := range tests {
		t.Run(tt.req.name, func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![SubTest::unresolved(vec![])]);
    }

    #[test]
    fn test_map_table_keys_resolve_as_a_set() {
        let code = r#"
package foo

import "testing"

func TestA3(t *testing.T) {
	tests := map[string]struct {
		a    int
		want int
	}{
		"test1": {a: 1, want: 3},
		"test2": {a: 2, want: 5},
	}

	for name, tt := range tests {
		t.Run(name, func(t *testing.T) {
			if tt.a == tt.want {
				t.Fail()
			}
		})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        // Map iteration order is undefined at runtime, so assert set
        // equality, not sequence equality.
        let names: HashSet<&str> = subs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, HashSet::from(["test1", "test2"]));
        assert!(subs.iter().all(|s| !s.is_unresolved));
    }

    #[test]
    fn test_concatenated_name_stays_unresolved() {
        let code = r#"
package foo

import (
	"strconv"
	"testing"
)

func TestA4(t *testing.T) {
	for i := 0; i < 3; i++ {
		t.Run("test"+strconv.Itoa(i), func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![SubTest::unresolved(vec![])]);
        assert_eq!(subs[0].name, UNRESOLVED_NAME);
    }

    #[test]
    fn test_formatted_name_stays_unresolved() {
        let code = r#"
package foo

import (
	"fmt"
	"testing"
)

func TestA5(t *testing.T) {
	for i := 0; i < 3; i++ {
		t.Run(fmt.Sprintf("test%d", i), func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![SubTest::unresolved(vec![])]);
    }

    #[test]
    fn test_three_level_nesting_keeps_tree_shape() {
        let code = r#"
package bar

import "testing"

func TestC1(t *testing.T) {
	t.Run("test1", func(t *testing.T) {
		t.Run("subtest1", func(t *testing.T) {})
		t.Run("subtest2", func(t *testing.T) {})
		t.Run("subtest3", func(t *testing.T) {
			t.Run("subsubtest1", func(t *testing.T) {})
			t.Run("subsubtest2", func(t *testing.T) {})
		})
	})
}
"#;
        let got = scan(code);
        let want = vec![TestFunction {
            name: "TestC1".to_string(),
            subs: vec![SubTest::resolved(
                "test1",
                vec![
                    leaf("subtest1"),
                    leaf("subtest2"),
                    SubTest::resolved(
                        "subtest3",
                        vec![leaf("subsubtest1"), leaf("subsubtest2")],
                    ),
                ],
            )],
        }];
        assert_eq!(got, want);
    }

    #[test]
    fn test_table_rows_replicate_nested_subtree() {
        let code = r#"
package foo

import "testing"

func TestD1(t *testing.T) {
	tests := []struct {
		name string
	}{
		{"test1"},
		{"test2"},
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {
			t.Run("inner", func(t *testing.T) {})
		})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        let want_children = vec![leaf("inner")];
        assert_eq!(
            *subs,
            vec![
                SubTest::resolved("test1", want_children.clone()),
                SubTest::resolved("test2", want_children),
            ]
        );
    }

    #[test]
    fn test_nested_closure_does_not_inherit_outer_bindings() {
        // The context chain resets at each registration call's closure, so a
        // table declared one closure up is invisible to the inner call.
        let code = r#"
package foo

import "testing"

func TestE1(t *testing.T) {
	tests := []struct {
		name string
	}{
		{"test1"},
	}

	for _, tt := range tests {
		t.Run("outer", func(t *testing.T) {
			t.Run(tt.name, func(t *testing.T) {})
		})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(
            *subs,
            vec![SubTest::resolved(
                "outer",
                vec![SubTest::unresolved(vec![])],
            )]
        );
    }

    #[test]
    fn test_context_declared_in_sibling_block_is_invisible() {
        let code = r#"
package foo

import "testing"

func TestF1(t *testing.T) {
	{
		tests := []struct {
			name string
		}{
			{"inner"},
		}
		_ = tests
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![SubTest::unresolved(vec![])]);
    }

    #[test]
    fn test_context_declared_before_block_is_visible_inside() {
        let code = r#"
package foo

import "testing"

func TestF2(t *testing.T) {
	tests := []struct {
		name string
	}{
		{"test1"},
	}

	{
		for _, tt := range tests {
			t.Run(tt.name, func(t *testing.T) {})
		}
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("test1")]);
    }

    #[test]
    fn test_non_string_values_at_name_position_are_skipped() {
        let code = r#"
package foo

import "testing"

func TestG1(t *testing.T) {
	tests := []struct {
		name string
		want int
	}{
		{"test1", 3},
		{2, 5},
	}

	for _, tt := range tests {
		t.Run(tt.name, func(t *testing.T) {})
	}
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("test1")]);
    }

    #[test]
    fn test_bare_identifier_without_map_binding_stays_unresolved() {
        let code = r#"
package foo

import "testing"

func TestH1(t *testing.T) {
	name := "test1"
	t.Run(name, func(t *testing.T) {})
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![SubTest::unresolved(vec![])]);
    }

    #[test]
    fn test_registration_call_is_found_among_other_statements() {
        // Statement-level calls are wrapped in an expression_statement node;
        // the discoverer must look through the wrapper to see the call.
        let code = r#"
package foo

import "testing"

func TestB1(t *testing.T) {
	t.Log("setup")
	t.Run("test1", func(t *testing.T) {})
	t.Cleanup(func() {})
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("test1")]);
    }

    #[test]
    fn test_run_call_with_single_argument_is_skipped() {
        let code = r#"
package foo

import "testing"

func TestI1(t *testing.T) {
	t.Run("lonely")
	t.Run("ok", func(t *testing.T) {})
}
"#;
        let subs = &scan(code)[0].subs;
        assert_eq!(*subs, vec![leaf("ok")]);
    }

    #[test]
    fn test_non_test_declarations_are_skipped() {
        let code = r#"
package foo

import "testing"

func BenchmarkX(b *testing.B) {}

func TestOk(t *testing.T) {}

func TestHelperWithExtraParam(t *testing.T, n int) {}

func notATest(t *testing.T) {}
"#;
        let got = scan(code);
        let names: Vec<&str> = got.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["TestOk"]);
    }

    #[test]
    fn test_scan_file_reports_missing_path() {
        let err = scan_file(std::path::Path::new("does/not/exist_test.go"))
            .expect_err("missing file should fail");
        match err {
            ScanError::Io { path, .. } => assert!(path.contains("exist_test.go")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scan_project_filters_and_ignores_directories() {
        use std::fs;

        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("foo")).unwrap();
        fs::create_dir_all(root.join("vendor/pkg")).unwrap();
        fs::create_dir_all(root.join("gen")).unwrap();

        let test_src = r#"
package foo

import "testing"

func TestA(t *testing.T) {}
"#;
        fs::write(root.join("foo/a_test.go"), test_src).unwrap();
        fs::write(root.join("foo/a.go"), "package foo\n").unwrap();
        fs::write(root.join("vendor/pkg/v_test.go"), test_src).unwrap();
        fs::write(root.join("gen/g_test.go"), test_src).unwrap();

        let got = crate::parse::scan_project(root, &["gen".to_string()]).expect("scan");
        assert_eq!(got.len(), 1);
        let (path, functions) = got.iter().next().unwrap();
        assert!(path.ends_with("foo/a_test.go"));
        assert_eq!(functions[0].name, "TestA");
    }
}
