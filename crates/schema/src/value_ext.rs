use value::Value;

/// Extraction of variable references from argument values.
pub trait ValueExt {
    /// Names of all variables referenced anywhere inside this value.
    fn referenced_variables(&self) -> Vec<&str>;
}

impl ValueExt for Value {
    fn referenced_variables(&self) -> Vec<&str> {
        let mut variables = Vec::new();
        collect_variables(self, &mut variables);
        variables
    }
}

fn collect_variables<'a>(value: &'a Value, variables: &mut Vec<&'a str>) {
    match value {
        Value::Variable(name) => variables.push(name.as_str()),
        Value::List(values) => {
            for value in values {
                collect_variables(value, variables);
            }
        }
        Value::Object(fields) => {
            for value in fields.values() {
                collect_variables(value, variables);
            }
        }
        _ => {}
    }
}
