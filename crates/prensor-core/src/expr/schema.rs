use crate::{expr::Expr, value::PrimitiveType};
use prensor_schema::node::{Feature, Schema, ValueCount};

impl Expr {
    ///
    /// schema_string
    ///
    /// Indented outline of the known subtree, e.g.
    ///
    /// ```text
    /// repeated root:
    ///   optional int32 foo
    ///   optional bar:
    ///     optional string baz
    /// ```
    ///
    /// `limit` bounds the depth; a truncated subtree shows `  ...`.
    ///
    #[must_use]
    pub fn schema_string(&self, limit: Option<usize>) -> String {
        self.schema_lines("root", limit).join("\n")
    }

    fn schema_lines(&self, field_name: &str, limit: Option<usize>) -> Vec<String> {
        let label = if self.is_repeated() {
            "repeated"
        } else {
            "optional"
        };

        let mut lines = vec![match self.value_type() {
            Some(value_type) => format!("{label} {value_type} {field_name}"),
            None => format!("{label} {field_name}:"),
        }];

        let children = self.get_known_children();
        if limit == Some(0) {
            if !children.is_empty() {
                lines.push("  ...".to_string());
            }
            return lines;
        }

        let child_limit = limit.map(|l| l - 1);
        for (step, child) in children {
            lines.extend(
                child
                    .schema_lines(&step.to_string(), child_limit)
                    .into_iter()
                    .map(|line| format!("  {line}")),
            );
        }

        lines
    }

    ///
    /// get_schema
    ///
    /// Schema of the known subtree. Children without a schema feature get
    /// an empty one carrying the coarse type of a leaf (and
    /// `value_count.max = 1` when optional); internal children get their
    /// nested features as a struct domain.
    ///
    #[must_use]
    pub fn get_schema(&self) -> Schema {
        Schema::new(self.child_features())
    }

    fn child_features(&self) -> Vec<Feature> {
        self.get_known_children()
            .into_iter()
            .map(|(step, child)| {
                let mut feature = child.schema_feature().cloned().unwrap_or_else(|| {
                    let mut feature = Feature {
                        feature_type: child.value_type().map(PrimitiveType::feature_type),
                        ..Feature::default()
                    };
                    if !child.is_repeated() {
                        feature.value_count = Some(ValueCount {
                            min: None,
                            max: Some(1),
                        });
                    }
                    feature
                });

                let nested = child.child_features();
                if !nested.is_empty() {
                    feature.set_struct_features(nested);
                }
                feature.name = Some(step.to_string());

                feature
            })
            .collect()
    }
}
