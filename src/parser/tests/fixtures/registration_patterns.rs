// Test fixtures for class registration patterns

pub const SIMPLE_REGISTRATION: &str = r#"
Ext.define('MyApp.view.Main', {
    extend: 'Ext.panel.Panel',
    alias: 'widget.main',
    title: 'Main'
});
"#;

pub const LIST_CONFIGS: &str = r#"
Ext.define('MyApp.view.Grid', {
    extend: 'Ext.grid.Panel',
    alternateClassName: ['MyApp.Grid', 'MyGrid'],
    alias: ['widget.mygrid', 'widget.grid2'],
    xtype: 'mygrid'
});
"#;

pub const FACTORY_FUNCTION: &str = r#"
Ext.define('MyApp.util.Format', function (Format) {
    var helper = function () {};
    return {
        singleton: true,
        alternateClassName: 'Fmt'
    };
});
"#;

pub const ARROW_FACTORY: &str = r#"
Ext.define('MyApp.util.Arrow', () => ({
    alias: 'util.arrow'
}));
"#;

pub const ANNOTATED_REGISTRATION: &str = r#"
/**
 * Shared toolbar.
 * @alternateClassName MyApp.Toolbar
 * @xtype apptoolbar
 */
Ext.define('MyApp.view.Toolbar', {
    extend: 'Ext.toolbar.Toolbar',
    alias: 'widget.apptoolbar'
});
"#;

pub const CALLBACK_ARGUMENT: &str = r#"
Ext.define('MyApp.model.User', {
    extend: 'Ext.data.Model'
}, function () {
    console.log('defined');
});
"#;

pub const MALFORMED_REGISTRATIONS: &str = r#"
Ext.define('MyApp.Lonely');
Ext.define(className, {});
Ext.define('MyApp.Numeric', 42);
Ext.define('MyApp.Valid', {});
"#;

pub const TOO_MANY_ARGUMENTS: &str = r#"
Ext.define('MyApp.Crowded', {}, function () {}, 'extra');
"#;

pub const NESTED_REGISTRATIONS: &str = r#"
(function () {
    Ext.define('MyApp.Outer', {
        init: function () {
            Ext.define('MyApp.Inner', { alias: 'widget.inner' });
        }
    });
})();
"#;

pub const CUSTOM_FUNCTION: &str = r#"
MyApp.define('MyApp.Custom', { xtype: 'custom' });
Ext.define('MyApp.Standard', {});
"#;

pub const BROKEN_SYNTAX: &str = r#"
Ext.define('MyApp.BeforeError', {});
var = ;
Ext.define('MyApp.AfterError', {});
"#;
