//! The canonical introspection query text.

/// What [`get_introspection_query`] includes beyond the October 2021 baseline.
#[derive(Debug, Clone, Copy)]
pub struct IntrospectionQueryOptions {
    /// Include `description` fields.
    pub descriptions: bool,
    /// Include `specifiedByURL` on scalars.
    pub specified_by_url: bool,
    /// Include `isRepeatable` on directives.
    pub directive_is_repeatable: bool,
    /// Include the schema's own `description`.
    pub schema_description: bool,
    /// Include deprecation of arguments and input fields.
    pub input_value_deprecation: bool,
}

impl Default for IntrospectionQueryOptions {
    fn default() -> Self {
        Self {
            descriptions: true,
            specified_by_url: false,
            directive_is_repeatable: false,
            schema_description: false,
            input_value_deprecation: false,
        }
    }
}

/// Produce the source text of the full introspection query.
pub fn get_introspection_query(options: IntrospectionQueryOptions) -> String {
    let descriptions = if options.descriptions { "description" } else { "" };
    let specified_by_url = if options.specified_by_url {
        "specifiedByURL"
    } else {
        ""
    };
    let directive_is_repeatable = if options.directive_is_repeatable {
        "isRepeatable"
    } else {
        ""
    };
    let schema_description = if options.schema_description {
        descriptions
    } else {
        ""
    };
    let input_deprecation = |string: &'static str| -> &'static str {
        if options.input_value_deprecation {
            string
        } else {
            ""
        }
    };
    format!(
        r#"
query IntrospectionQuery {{
  __schema {{
    {schema_description}
    queryType {{ name }}
    mutationType {{ name }}
    subscriptionType {{ name }}
    types {{
      ...FullType
    }}
    directives {{
      name
      {descriptions}
      {directive_is_repeatable}
      locations
      args{args_include_deprecated} {{
        ...InputValue
      }}
    }}
  }}
}}

fragment FullType on __Type {{
  kind
  name
  {descriptions}
  {specified_by_url}
  fields(includeDeprecated: true) {{
    name
    {descriptions}
    args{args_include_deprecated} {{
      ...InputValue
    }}
    type {{
      ...TypeRef
    }}
    isDeprecated
    deprecationReason
  }}
  inputFields{args_include_deprecated} {{
    ...InputValue
  }}
  interfaces {{
    ...TypeRef
  }}
  enumValues(includeDeprecated: true) {{
    name
    {descriptions}
    isDeprecated
    deprecationReason
  }}
  possibleTypes {{
    ...TypeRef
  }}
}}

fragment InputValue on __InputValue {{
  name
  {descriptions}
  type {{ ...TypeRef }}
  defaultValue
  {input_value_deprecation}
}}

fragment TypeRef on __Type {{
  kind
  name
  ofType {{
    kind
    name
    ofType {{
      kind
      name
      ofType {{
        kind
        name
        ofType {{
          kind
          name
          ofType {{
            kind
            name
            ofType {{
              kind
              name
              ofType {{
                kind
                name
                ofType {{
                  kind
                  name
                }}
              }}
            }}
          }}
        }}
      }}
    }}
  }}
}}
"#,
        args_include_deprecated = input_deprecation("(includeDeprecated: true)"),
        input_value_deprecation = input_deprecation("isDeprecated deprecationReason"),
    )
}
