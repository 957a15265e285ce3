//! Input coercion: variable values from a request, and argument values from
//! literals in the document.
//!
//! <https://spec.graphql.org/October2021/#sec-Coercing-Variable-Values>
//! <https://spec.graphql.org/October2021/#sec-Coercing-Field-Arguments>

use crate::execution::engine::PropagateNull;
use crate::execution::GraphQLError;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::PathSegment;
use crate::schema::ExtendedType;
use crate::validation::Valid;
use crate::Schema;
use crate::SourceMap;
use graphyne_parser::ast;
use graphyne_parser::ast::Type;
use graphyne_parser::ast::Value;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;

/// Coerce the values of variables from a request to the types declared by
/// the operation.
///
/// On failure the request must not be executed; all coercion errors are
/// returned, each qualified with the variable name and the path inside its
/// value (`$input.name`, `$input[1]`). When `max_errors` is exceeded, a
/// final "too many errors" entry is appended and coercion aborts.
pub fn coerce_variable_values(
    schema: &Valid<Schema>,
    operation: &ast::OperationDefinition,
    values: &JsonMap,
    sources: &SourceMap,
    max_errors: Option<usize>,
) -> Result<Valid<JsonMap>, Vec<GraphQLError>> {
    let mut coercion = VariableCoercion {
        schema,
        sources,
        errors: Vec::new(),
        max_errors,
        aborted: false,
    };
    let mut coerced_values = JsonMap::new();
    for variable_def in &operation.variables {
        if coercion.aborted {
            break;
        }
        let name = variable_def.name.as_str();
        if let Some(value) = values.get(name) {
            if let Some(coerced) = coercion.coerce(
                &format!("${name}"),
                &variable_def.ty,
                value,
                variable_def.location(),
            ) {
                coerced_values.insert(name.to_owned(), coerced);
            }
        } else if let Some(default) = &variable_def.default_value {
            match const_value_to_json(default) {
                Ok(value) => {
                    coerced_values.insert(name.to_owned(), value);
                }
                Err(message) => coercion.push_error(
                    format!("invalid default value for variable ${name}: {message}"),
                    default.location(),
                ),
            }
        } else if variable_def.ty.is_non_null() {
            coercion.push_error(
                format!("missing value for non-null variable ${name}"),
                variable_def.location(),
            );
        } else {
            // Nullable variable with no provided value nor explicit default:
            // absent is semantically different from an explicit null,
            // so nothing is inserted
        }
    }
    if coercion.errors.is_empty() {
        Ok(Valid(coerced_values))
    } else {
        Err(coercion.errors)
    }
}

struct VariableCoercion<'a> {
    schema: &'a Valid<Schema>,
    sources: &'a SourceMap,
    errors: Vec<GraphQLError>,
    max_errors: Option<usize>,
    aborted: bool,
}

impl VariableCoercion<'_> {
    fn push_error(&mut self, message: impl Into<String>, location: Option<SourceSpan>) {
        if self.aborted {
            return;
        }
        if let Some(max_errors) = self.max_errors {
            if self.errors.len() >= max_errors {
                self.aborted = true;
                self.errors.push(GraphQLError::new(
                    "too many coercion errors, aborting",
                    None,
                    self.sources,
                ));
                return;
            }
        }
        self.errors
            .push(GraphQLError::new(message, location, self.sources));
    }

    /// Returns `None` if at least one error was recorded for this value.
    fn coerce(
        &mut self,
        path: &str,
        ty: &Type,
        value: &JsonValue,
        location: Option<SourceSpan>,
    ) -> Option<JsonValue> {
        if self.aborted {
            return None;
        }
        if value.is_null() {
            if ty.is_non_null() {
                self.push_error(
                    format!("null value at {path} for non-null type {ty}"),
                    location,
                );
                return None;
            }
            return Some(JsonValue::Null);
        }
        let ty_name = match ty {
            Type::List(inner) | Type::NonNullList(inner) => {
                // https://spec.graphql.org/October2021/#sec-List.Input-Coercion
                return match value.as_array() {
                    Some(items) => {
                        let mut coerced = Vec::with_capacity(items.len());
                        let mut failed = false;
                        for (index, item) in items.iter().enumerate() {
                            match self.coerce(&format!("{path}[{index}]"), inner, item, location) {
                                Some(item) => coerced.push(item),
                                None => failed = true,
                            }
                        }
                        (!failed).then(|| coerced.into())
                    }
                    // A single value is treated as a list of size one
                    None => self
                        .coerce(path, inner, value, location)
                        .map(|item| vec![item].into()),
                };
            }
            Type::Named(name) | Type::NonNullNamed(name) => name,
        };
        match self.schema.types.get(ty_name.as_str()) {
            None => {
                self.push_error(format!("undefined type {ty_name} at {path}"), location);
                None
            }
            Some(ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_)) => {
                self.push_error(
                    format!("non-input type {ty_name} at {path}"),
                    location,
                );
                None
            }
            Some(ExtendedType::Scalar(_)) => {
                self.coerce_scalar(path, ty_name.as_str(), value, location)
            }
            Some(ExtendedType::Enum(def)) => {
                // https://spec.graphql.org/October2021/#sec-Enums.Input-Coercion
                if let Some(str) = value.as_str() {
                    if def.values.contains_key(str) {
                        return Some(value.clone());
                    }
                }
                self.push_error(
                    format!("{value} at {path} is not a value of enum {ty_name}"),
                    location,
                );
                None
            }
            Some(ExtendedType::InputObject(def)) => {
                // https://spec.graphql.org/October2021/#sec-Input-Objects.Input-Coercion
                let Some(object) = value.as_object() else {
                    self.push_error(
                        format!("expected an input object of type {ty_name} at {path}, found {value}"),
                        location,
                    );
                    return None;
                };
                let mut failed = false;
                for key in object.keys() {
                    if !def.fields.contains_key(key.as_str()) {
                        self.push_error(
                            format!("input object at {path} has a key {key} not in type {ty_name}"),
                            location,
                        );
                        failed = true;
                    }
                }
                let mut coerced = JsonMap::new();
                for (field_name, field_def) in &def.fields {
                    let field_path = || format!("{path}.{field_name}");
                    if let Some(field_value) = object.get(field_name.as_str()) {
                        match self.coerce(&field_path(), &field_def.ty, field_value, location) {
                            Some(value) => {
                                coerced.insert(field_name.to_string(), value);
                            }
                            None => failed = true,
                        }
                    } else if let Some(default) = &field_def.default_value {
                        match const_value_to_json(default) {
                            Ok(value) => {
                                coerced.insert(field_name.to_string(), value);
                            }
                            Err(message) => {
                                self.push_error(
                                    format!(
                                        "invalid default value at {}: {message}",
                                        field_path()
                                    ),
                                    default.location(),
                                );
                                failed = true;
                            }
                        }
                    } else if field_def.ty.is_non_null() {
                        self.push_error(
                            format!(
                                "missing value at {} for non-null input field \
                                 {ty_name}.{field_name}",
                                field_path()
                            ),
                            location,
                        );
                        failed = true;
                    }
                }
                if def.is_one_of() {
                    let one_non_null = coerced.len() == 1
                        && coerced.values().next().is_some_and(|value| !value.is_null());
                    if !one_non_null {
                        self.push_error(
                            format!(
                                "the @oneOf input object {ty_name} at {path} must have \
                                 exactly one non-null field"
                            ),
                            location,
                        );
                        failed = true;
                    }
                }
                (!failed).then(|| coerced.into())
            }
        }
    }

    fn coerce_scalar(
        &mut self,
        path: &str,
        ty_name: &str,
        value: &JsonValue,
        location: Option<SourceSpan>,
    ) -> Option<JsonValue> {
        match ty_name {
            "Int" => {
                // https://spec.graphql.org/October2021/#sec-Int.Input-Coercion
                if value
                    .as_i64()
                    .is_some_and(|value| i32::try_from(value).is_ok())
                {
                    return Some(value.clone());
                }
            }
            "Float" => {
                // https://spec.graphql.org/October2021/#sec-Float.Input-Coercion
                if value.as_f64().is_some_and(f64::is_finite) {
                    return Some(value.clone());
                }
            }
            "String" => {
                if value.is_string() {
                    return Some(value.clone());
                }
            }
            "Boolean" => {
                if value.is_boolean() {
                    return Some(value.clone());
                }
            }
            "ID" => {
                // https://spec.graphql.org/October2021/#sec-ID.Input-Coercion
                if value.is_string() {
                    return Some(value.clone());
                }
                // An integer ID is coerced to its string form
                if let Some(int) = value.as_i64() {
                    return Some(int.to_string().into());
                }
            }
            custom => {
                return match self.schema.scalars.get(custom) {
                    Some(coercion) => match coercion.parse_value(value) {
                        Ok(coerced) => Some(coerced),
                        Err(message) => {
                            self.push_error(
                                format!("invalid value at {path} for scalar {custom}: {message}"),
                                location,
                            );
                            None
                        }
                    },
                    // Custom scalars without a registered coercer
                    // accept any JSON value
                    None => Some(value.clone()),
                };
            }
        }
        self.push_error(
            format!("{value} at {path} cannot be coerced to type {ty_name}"),
            location,
        );
        None
    }
}

/// Convert a constant value literal to JSON. Variables are not in scope;
/// encountering one means validation was skipped.
pub fn const_value_to_json(value: &Value) -> Result<JsonValue, String> {
    match value {
        Value::Variable(name) => Err(format!("variable ${name} in a constant value")),
        other => literal_to_json(other, &JsonMap::new()),
    }
}

/// Convert a value literal to JSON, substituting variable references from
/// the given coerced variable values. An absent variable becomes null.
pub fn literal_to_json(value: &Value, variables: &JsonMap) -> Result<JsonValue, String> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or(JsonValue::Null),
        Value::Enum(name) => name.as_str().into(),
        Value::String(text) => text.as_str().into(),
        Value::Boolean(value) => (*value).into(),
        Value::Int(value) => (*value).into(),
        // Rely on `serde_json::Number`'s own parser for extended precision
        Value::BigInt(digits) => JsonValue::Number(
            digits
                .parse()
                .map_err(|_| format!("integer value {digits} overflows"))?,
        ),
        Value::Float(value) => serde_json::Number::from_f64(value.into_inner())
            .ok_or_else(|| "non-finite float value".to_owned())?
            .into(),
        Value::List(items) => items
            .iter()
            .map(|item| literal_to_json(item, variables))
            .collect::<Result<Vec<_>, _>>()?
            .into(),
        Value::Object(fields) => {
            let mut object = JsonMap::new();
            for (key, item) in fields {
                object.insert(key.to_string(), literal_to_json(item, variables)?);
            }
            object.into()
        }
    })
}

/// <https://spec.graphql.org/October2021/#sec-Coercing-Field-Arguments>
pub(crate) fn coerce_argument_values(
    schema: &Valid<Schema>,
    sources: &SourceMap,
    variable_values: &JsonMap,
    errors: &mut Vec<GraphQLError>,
    path: &[PathSegment],
    field_def: &ast::FieldDefinition,
    field: &ast::Field,
) -> Result<JsonMap, PropagateNull> {
    let mut coerced_values = JsonMap::new();
    for arg_def in &field_def.arguments {
        let arg_name = &arg_def.name;
        if let Some(arg) = field.arguments.iter().find(|arg| arg.name == *arg_name) {
            if let Value::Variable(var_name) = &*arg.value {
                // An argument set to an absent variable behaves
                // as if the argument was omitted
                if let Some(var_value) = variable_values.get(var_name.as_str()) {
                    if var_value.is_null() && arg_def.ty.is_non_null() {
                        errors.push(GraphQLError::field_error(
                            format!("null value for non-null argument {arg_name}"),
                            path,
                            arg.location(),
                            sources,
                        ));
                        return Err(PropagateNull);
                    }
                    coerced_values.insert(arg_name.to_string(), var_value.clone());
                    continue;
                }
            } else if arg.value.is_null() && arg_def.ty.is_non_null() {
                errors.push(GraphQLError::field_error(
                    format!("null value for non-null argument {arg_name}"),
                    path,
                    arg.location(),
                    sources,
                ));
                return Err(PropagateNull);
            } else {
                let coerced_value = coerce_argument_value(
                    schema,
                    sources,
                    variable_values,
                    errors,
                    path,
                    arg_name.as_str(),
                    &arg_def.ty,
                    &arg.value,
                )?;
                coerced_values.insert(arg_name.to_string(), coerced_value);
                continue;
            }
        }
        if let Some(default) = &arg_def.default_value {
            let value = const_value_to_json(default).map_err(|message| {
                errors.push(GraphQLError::field_error(
                    format!("invalid default value for argument {arg_name}: {message}"),
                    path,
                    arg_def.location(),
                    sources,
                ));
                PropagateNull
            })?;
            coerced_values.insert(arg_name.to_string(), value);
            continue;
        }
        if arg_def.ty.is_non_null() {
            errors.push(GraphQLError::field_error(
                format!("missing value for required argument {arg_name}"),
                path,
                field.name.location(),
                sources,
            ));
            return Err(PropagateNull);
        }
    }
    Ok(coerced_values)
}

#[allow(clippy::too_many_arguments)] // internal, and the call stack carries real state
fn coerce_argument_value(
    schema: &Valid<Schema>,
    sources: &SourceMap,
    variable_values: &JsonMap,
    errors: &mut Vec<GraphQLError>,
    path: &[PathSegment],
    name: &str,
    ty: &Type,
    value: &Node<Value>,
) -> Result<JsonValue, PropagateNull> {
    macro_rules! field_error {
        ($($arg: tt)+) => {{
            errors.push(GraphQLError::field_error(
                format!($($arg)+),
                path,
                value.location(),
                sources,
            ));
            return Err(PropagateNull);
        }};
    }
    if value.is_null() {
        if ty.is_non_null() {
            field_error!("null value for non-null argument position {name}")
        }
        return Ok(JsonValue::Null);
    }
    if let Some(var_name) = value.as_variable() {
        if let Some(var_value) = variable_values.get(var_name.as_str()) {
            if var_value.is_null() && ty.is_non_null() {
                field_error!("null variable value ${var_name} for non-null position {name}")
            }
            return Ok(var_value.clone());
        }
        if ty.is_non_null() {
            field_error!("missing variable ${var_name} for non-null position {name}")
        }
        return Ok(JsonValue::Null);
    }
    let ty_name = match ty {
        Type::List(inner) | Type::NonNullList(inner) => {
            // https://spec.graphql.org/October2021/#sec-List.Input-Coercion
            return match value.as_list() {
                Some(items) => items
                    .iter()
                    .map(|item| {
                        coerce_argument_value(
                            schema,
                            sources,
                            variable_values,
                            errors,
                            path,
                            name,
                            inner,
                            item,
                        )
                    })
                    .collect(),
                // A single value is treated as a list of size one
                None => Ok(JsonValue::Array(vec![coerce_argument_value(
                    schema,
                    sources,
                    variable_values,
                    errors,
                    path,
                    name,
                    inner,
                    value,
                )?])),
            };
        }
        Type::Named(ty_name) | Type::NonNullNamed(ty_name) => ty_name,
    };
    let Some(ty_def) = schema.types.get(ty_name.as_str()) else {
        field_error!("undefined type {ty_name} for argument position {name}")
    };
    match ty_def {
        ExtendedType::InputObject(ty_def) => {
            // https://spec.graphql.org/October2021/#sec-Input-Objects.Input-Coercion
            let Some(object) = value.as_object() else {
                field_error!("expected an input object of type {ty_name} for {name}")
            };
            if let Some((key, _)) = object
                .iter()
                .find(|(key, _)| !ty_def.fields.contains_key(key.as_str()))
            {
                field_error!("input object for {name} has a key {key} not in type {ty_name}")
            }
            let mut coerced_object = JsonMap::new();
            for (field_name, field_def) in &ty_def.fields {
                let provided = object.iter().find(|(key, _)| key == field_name);
                if let Some((_, field_value)) = provided {
                    let coerced_value = coerce_argument_value(
                        schema,
                        sources,
                        variable_values,
                        errors,
                        path,
                        field_name.as_str(),
                        &field_def.ty,
                        field_value,
                    )?;
                    coerced_object.insert(field_name.to_string(), coerced_value);
                } else if let Some(default) = &field_def.default_value {
                    let default_value = const_value_to_json(default).map_err(|message| {
                        errors.push(GraphQLError::field_error(
                            format!(
                                "invalid default value for input field \
                                 {ty_name}.{field_name}: {message}"
                            ),
                            path,
                            value.location(),
                            sources,
                        ));
                        PropagateNull
                    })?;
                    coerced_object.insert(field_name.to_string(), default_value);
                } else if field_def.ty.is_non_null() {
                    field_error!(
                        "missing value for non-null input object field {ty_name}.{field_name}"
                    )
                }
            }
            if ty_def.is_one_of() {
                let one_non_null = coerced_object.len() == 1
                    && coerced_object
                        .values()
                        .next()
                        .is_some_and(|value| !value.is_null());
                if !one_non_null {
                    field_error!(
                        "the @oneOf input object {ty_name} for {name} must have \
                         exactly one non-null field"
                    )
                }
            }
            Ok(coerced_object.into())
        }
        ExtendedType::Enum(ty_def) => {
            // Enums are only valid as bare enum literals
            match value.as_enum() {
                Some(enum_value) if ty_def.values.contains_key(enum_value.as_str()) => {
                    Ok(enum_value.as_str().into())
                }
                _ => field_error!("{value} is not a value of enum {ty_name}"),
            }
        }
        ExtendedType::Scalar(scalar) => {
            if let Some(coercion) = schema.scalars.get(&scalar.name) {
                match coercion.parse_literal(value, variable_values) {
                    Ok(coerced) => Ok(coerced),
                    Err(message) => {
                        field_error!("invalid value for scalar {ty_name}: {message}")
                    }
                }
            } else {
                literal_to_json(value, variable_values).map_err(|message| {
                    errors.push(GraphQLError::field_error(
                        format!("could not coerce {name} to type {ty_name}: {message}"),
                        path,
                        value.location(),
                        sources,
                    ));
                    PropagateNull
                })
            }
        }
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            field_error!("non-input type {ty_name} for argument position {name}")
        }
    }
}
